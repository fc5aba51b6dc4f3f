//! Staged products
//!
//! HTTP implementation of [`ProductMetadata`] on top of [`OpsmanClient`].

use super::client::OpsmanClient;
use crate::error::ApiError;
use crate::export::{ProductMetadata, StagedProduct};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
impl ProductMetadata for OpsmanClient {
    async fn staged_products(&self) -> Result<Vec<StagedProduct>, ApiError> {
        let path = self.staged_products_path();
        let response = self.get(&path).await?;

        serde_json::from_value(response).map_err(|source| ApiError::Decode {
            url: self.api_url(&path).unwrap_or(path),
            source,
        })
    }

    async fn properties(&self, guid: &str) -> Result<Value, ApiError> {
        self.get(&self.staged_product_path(guid, "properties")).await
    }

    async fn resources(&self, guid: &str) -> Result<Value, ApiError> {
        self.get(&self.staged_product_path(guid, "resources")).await
    }

    async fn networks_and_azs(&self, guid: &str) -> Result<Value, ApiError> {
        self.get(&self.staged_product_path(guid, "networks_and_azs")).await
    }
}
