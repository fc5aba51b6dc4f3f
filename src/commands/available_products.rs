//! available-products command

use super::format_table;
use crate::opsman::{AvailableProductsService, OpsmanClient};
use anyhow::{Context, Result};

pub async fn execute(client: &OpsmanClient) -> Result<()> {
    let products = AvailableProductsService::new(client)
        .list()
        .await
        .context("Failed to list available products")?;

    if products.is_empty() {
        println!("no available products found");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = products
        .into_iter()
        .map(|p| vec![p.name, p.version])
        .collect();

    println!("{}", format_table(&["NAME", "VERSION"], &rows));
    Ok(())
}
