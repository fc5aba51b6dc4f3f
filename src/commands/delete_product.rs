//! delete-product command

use crate::opsman::{AvailableProductsService, OpsmanClient};
use anyhow::{bail, Context, Result};
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct DeleteProductArgs {
    /// Name of the product to delete
    #[arg(short = 'p', long = "product-name")]
    pub product_name: Option<String>,

    /// Version of the product to delete
    #[arg(short = 'v', long = "product-version")]
    pub product_version: Option<String>,

    /// Delete every unused product instead of a single one
    #[arg(long, conflicts_with_all = ["product_name", "product_version"])]
    pub all: bool,
}

pub async fn execute(args: DeleteProductArgs, client: &OpsmanClient) -> Result<()> {
    let service = AvailableProductsService::new(client);

    if args.all {
        service.delete("", "", true).await.context("Failed to delete unused products")?;
        eprintln!("deleted all unused products");
        return Ok(());
    }

    let (Some(name), Some(version)) = (args.product_name, args.product_version) else {
        bail!("--product-name and --product-version are required unless --all is given");
    };

    service
        .delete(&name, &version, false)
        .await
        .with_context(|| format!("Failed to delete {} {}", name, version))?;
    eprintln!("deleted {} {}", name, version);
    Ok(())
}
