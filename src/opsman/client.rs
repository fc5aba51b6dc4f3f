//! Ops Manager Client
//!
//! Main client for interacting with the Ops Manager API, combining
//! authentication and HTTP functionality.

use super::auth::{Grant, OpsmanCredentials};
use super::http::{HttpSettings, OpsmanHttpClient};
use crate::error::ApiError;
use serde_json::Value;
use url::Url;

/// Main Ops Manager client
#[derive(Clone)]
pub struct OpsmanClient {
    pub credentials: OpsmanCredentials,
    pub http: OpsmanHttpClient,
    target: Url,
}

impl OpsmanClient {
    /// Create a new client for the Ops Manager at `target`
    pub fn new(target: &str, grant: Grant, settings: &HttpSettings) -> Result<Self, ApiError> {
        let target = parse_target(target)?;
        let http = OpsmanHttpClient::new(settings)?;
        let credentials = OpsmanCredentials::new(join(&target, "uaa/oauth/token")?, grant);

        Ok(Self {
            credentials,
            http,
            target,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String, ApiError> {
        self.credentials.get_token(&self.http).await
    }

    /// Make a GET request to an API path such as `api/v0/staged/products`
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.api_url(path)?;
        let token = self.get_token().await?;
        self.http.get(&url, &token).await
    }

    /// Make a DELETE request to an API path
    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.api_url(path)?;
        let token = self.get_token().await?;
        self.http.delete(&url, &token, query).await
    }

    /// Build an absolute URL for an API path
    pub fn api_url(&self, path: &str) -> Result<String, ApiError> {
        join(&self.target, path)
    }

    // =========================================================================
    // Staged products API helpers
    // =========================================================================

    pub fn staged_products_path(&self) -> String {
        "api/v0/staged/products".to_string()
    }

    /// Path of a per-product sub-resource, e.g. `properties` or `networks_and_azs`
    pub fn staged_product_path(&self, guid: &str, resource: &str) -> String {
        format!(
            "api/v0/staged/products/{}/{}",
            urlencoding::encode(guid),
            resource
        )
    }

    // =========================================================================
    // Available products API helpers
    // =========================================================================

    pub fn available_products_path(&self) -> String {
        "api/v0/available_products".to_string()
    }
}

/// Parse the --target value, defaulting to https when no scheme is given
fn parse_target(target: &str) -> Result<Url, ApiError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidTarget(target.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|_| ApiError::InvalidTarget(target.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join(base: &Url, path: &str) -> Result<String, ApiError> {
    base.join(path.trim_start_matches('/'))
        .map(String::from)
        .map_err(|_| ApiError::InvalidTarget(format!("{}{}", base, path)))
}
