//! export-config command

use crate::export::{export_config, Destination};
use crate::opsman::OpsmanClient;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ExportConfigArgs {
    /// Staged product to export (installation name or product type)
    #[arg(short = 'p', long = "product-name")]
    pub product_name: String,

    /// File to write the template to, standard output when omitted
    #[arg(short, long = "output-file")]
    pub output_file: Option<PathBuf>,
}

pub async fn execute(args: ExportConfigArgs, client: &OpsmanClient) -> Result<()> {
    let destination = Destination::from_arg(args.output_file.as_deref());

    let document = export_config(client, &args.product_name, &destination)
        .await
        .with_context(|| format!("Failed to export configuration of {}", args.product_name))?;

    if let Destination::File(path) = &destination {
        eprintln!(
            "Exported {} properties and {} jobs of {} to {}",
            document.product_properties.len(),
            document.resource_config.len(),
            args.product_name,
            path.display()
        );
    }

    Ok(())
}
