//! upload-product command

use crate::opsman::available::{percent, ProgressCallback};
use crate::opsman::{AvailableProductsService, OpsmanClient, UploadProductInput};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct UploadProductArgs {
    /// Path to the product file
    #[arg(short = 'p', long)]
    pub product: PathBuf,

    /// Seconds between upload progress reports
    #[arg(long, default_value_t = 1)]
    pub polling_interval: u64,

    /// Skip the upload when this product name and version is already available
    #[arg(long = "product-name", requires = "product_version")]
    pub product_name: Option<String>,

    /// Version that goes with --product-name
    #[arg(long = "product-version", requires = "product_name")]
    pub product_version: Option<String>,
}

pub async fn execute(args: UploadProductArgs, client: &OpsmanClient) -> Result<()> {
    let service = AvailableProductsService::new(client);

    if let (Some(name), Some(version)) = (&args.product_name, &args.product_version) {
        let available = service
            .check_product_availability(name, version)
            .await
            .context("Failed to check available products")?;
        if available {
            eprintln!("product {} {} is already uploaded, nothing to be done", name, version);
            return Ok(());
        }
    }

    let input = UploadProductInput {
        path: args.product.clone(),
        polling_interval: Duration::from_secs(args.polling_interval),
    };

    let on_progress: ProgressCallback = Arc::new(|sent: u64, total: u64| {
        eprintln!("uploaded {} of {} bytes ({}%)", sent, total, percent(sent, total));
    });

    service
        .upload(&input, on_progress)
        .await
        .with_context(|| format!("Failed to upload {}", args.product.display()))?;

    eprintln!("finished upload");
    Ok(())
}
