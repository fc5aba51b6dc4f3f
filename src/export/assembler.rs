//! Export assembler
//!
//! Fetches the three source documents for a product, runs the normalizers
//! and writes the result. Nothing is written unless every step succeeded.

use super::metadata::ProductMetadata;
use super::model::{ExportDocument, NetworksAndAzsResponse, PropertiesResponse, ResourcesResponse};
use super::networks::normalize_networks;
use super::properties::filter_properties;
use super::resources::normalize_resources;
use crate::error::{Document, ExportError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where the rendered document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// `None` or `-` means standard output
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Destination::File(path.to_path_buf()),
            _ => Destination::Stdout,
        }
    }
}

/// Build the export document for a product name
pub async fn export_product<M>(metadata: &M, product_name: &str) -> Result<ExportDocument, ExportError>
where
    M: ProductMetadata + ?Sized,
{
    let guid = metadata.find_product_guid(product_name).await?;
    tracing::info!("Exporting configuration of {} ({})", product_name, guid);
    assemble(metadata, &guid).await
}

/// Build the export document for a staged product GUID
pub async fn assemble<M>(metadata: &M, guid: &str) -> Result<ExportDocument, ExportError>
where
    M: ProductMetadata + ?Sized,
{
    let (properties, resources, networks) = futures::try_join!(
        fetch::<PropertiesResponse, _>(Document::Properties, metadata.properties(guid)),
        fetch::<ResourcesResponse, _>(Document::Resources, metadata.resources(guid)),
        fetch::<NetworksAndAzsResponse, _>(Document::NetworksAndAzs, metadata.networks_and_azs(guid)),
    )?;

    Ok(ExportDocument {
        product_properties: filter_properties(&properties.properties)?,
        network_properties: normalize_networks(&networks.networks_and_azs),
        resource_config: normalize_resources(&resources.resources)?,
    })
}

async fn fetch<T, F>(document: Document, request: F) -> Result<T, ExportError>
where
    T: DeserializeOwned,
    F: std::future::Future<Output = Result<Value, crate::error::ApiError>>,
{
    let value = request.await.map_err(ExportError::fetch(document))?;
    serde_json::from_value(value).map_err(ExportError::decode(document))
}

/// Render the document as YAML
pub fn render(document: &ExportDocument) -> Result<String, ExportError> {
    let yaml = serde_yaml::to_string(document)?;
    Ok(format!("---\n{}", yaml))
}

/// Write a fully rendered document to its destination.
///
/// Files are written next to the target and renamed into place, so a failed
/// write leaves any previous file untouched.
pub fn write_rendered(rendered: &str, destination: &Destination) -> Result<(), ExportError> {
    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|source| ExportError::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
        }
        Destination::File(path) => write_file_atomically(path, rendered),
    }
}

fn write_file_atomically(path: &Path, contents: &str) -> Result<(), ExportError> {
    let write_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let staging = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Err(err) = std::fs::write(&staging, contents) {
        let _ = std::fs::remove_file(&staging);
        return Err(write_error(err));
    }

    std::fs::rename(&staging, path).map_err(|err| {
        let _ = std::fs::remove_file(&staging);
        write_error(err)
    })?;

    tracing::info!("Wrote export to {}", path.display());
    Ok(())
}

/// Export a product and write it out in one go
pub async fn export_config<M>(
    metadata: &M,
    product_name: &str,
    destination: &Destination,
) -> Result<ExportDocument, ExportError>
where
    M: ProductMetadata + ?Sized,
{
    let document = export_product(metadata, product_name).await?;
    let rendered = render(&document)?;
    write_rendered(&rendered, destination)?;
    Ok(document)
}
