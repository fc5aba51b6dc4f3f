//! Product metadata boundary
//!
//! The export engine only needs four read operations from Ops Manager.
//! [`crate::opsman::OpsmanClient`] implements them over HTTP; tests can
//! substitute an in-memory fake.

use crate::error::{ApiError, Document, ExportError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// One entry of `GET /api/v0/staged/products`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StagedProduct {
    pub installation_name: String,
    pub guid: String,
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub product_version: String,
}

#[async_trait]
pub trait ProductMetadata: Send + Sync {
    /// All currently staged products
    async fn staged_products(&self) -> Result<Vec<StagedProduct>, ApiError>;

    /// Raw property definitions document for a product
    async fn properties(&self, guid: &str) -> Result<Value, ApiError>;

    /// Raw resource definitions document for a product
    async fn resources(&self, guid: &str) -> Result<Value, ApiError>;

    /// Raw network and AZ bindings document for a product
    async fn networks_and_azs(&self, guid: &str) -> Result<Value, ApiError>;

    /// Resolve a product name to the GUID of its staged installation.
    ///
    /// An exact `installation_name` match wins. Otherwise the name is taken
    /// as a product type, which must match exactly one staged product.
    async fn find_product_guid(&self, name: &str) -> Result<String, ExportError> {
        let products = self
            .staged_products()
            .await
            .map_err(ExportError::fetch(Document::StagedProducts))?;

        resolve_guid(&products, name)
    }
}

pub(crate) fn resolve_guid(products: &[StagedProduct], name: &str) -> Result<String, ExportError> {
    if let Some(product) = products.iter().find(|p| p.installation_name == name) {
        return Ok(product.guid.clone());
    }

    let by_type: Vec<&StagedProduct> = products.iter().filter(|p| p.product_type == name).collect();
    match by_type.as_slice() {
        [] => Err(ExportError::ProductNotFound(name.to_string())),
        [product] => Ok(product.guid.clone()),
        many => Err(ExportError::AmbiguousProduct {
            name: name.to_string(),
            candidates: many
                .iter()
                .map(|p| p.installation_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
