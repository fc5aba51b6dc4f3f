//! Subcommands

pub mod available_products;
pub mod configure;
pub mod delete_product;
pub mod export_config;
pub mod staged_products;
pub mod upload_product;

use crate::config::{Config, ConnectionOverrides};
use crate::opsman::OpsmanClient;
use anyhow::{Context, Result};
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export the configuration of a staged product as a YAML template
    ExportConfig(export_config::ExportConfigArgs),

    /// List staged products
    StagedProducts,

    /// List products uploaded to Ops Manager
    AvailableProducts,

    /// Upload a product file to Ops Manager
    UploadProduct(upload_product::UploadProductArgs),

    /// Delete an uploaded product, or all unused products
    DeleteProduct(delete_product::DeleteProductArgs),

    /// Save connection defaults to the config file
    Configure(configure::ConfigureArgs),
}

impl Commands {
    pub async fn execute(self, overrides: &ConnectionOverrides, config: Config) -> Result<()> {
        match self {
            Commands::Configure(args) => configure::execute(args, config),
            Commands::ExportConfig(args) => {
                export_config::execute(args, &connect(overrides, &config)?).await
            }
            Commands::StagedProducts => staged_products::execute(&connect(overrides, &config)?).await,
            Commands::AvailableProducts => {
                available_products::execute(&connect(overrides, &config)?).await
            }
            Commands::UploadProduct(args) => {
                upload_product::execute(args, &connect(overrides, &config)?).await
            }
            Commands::DeleteProduct(args) => {
                delete_product::execute(args, &connect(overrides, &config)?).await
            }
        }
    }
}

fn connect(overrides: &ConnectionOverrides, config: &Config) -> Result<OpsmanClient> {
    let settings = config.resolve(overrides, |name| std::env::var(name).ok())?;
    tracing::info!("Using Ops Manager at {}", settings.target);

    OpsmanClient::new(&settings.target, settings.grant, &settings.http)
        .context("Failed to create Ops Manager client")
}

/// Render rows as left-aligned columns
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = vec![format_row(headers, &widths)];
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(format_row(&cells, &widths));
    }
    out.join("\n")
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
