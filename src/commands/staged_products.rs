//! staged-products command

use super::format_table;
use crate::export::ProductMetadata;
use crate::opsman::OpsmanClient;
use anyhow::{Context, Result};

pub async fn execute(client: &OpsmanClient) -> Result<()> {
    let products = client
        .staged_products()
        .await
        .context("Failed to list staged products")?;

    let rows: Vec<Vec<String>> = products
        .into_iter()
        .map(|p| vec![p.installation_name, p.product_type, p.product_version, p.guid])
        .collect();

    println!("{}", format_table(&["NAME", "TYPE", "VERSION", "GUID"], &rows));
    Ok(())
}
