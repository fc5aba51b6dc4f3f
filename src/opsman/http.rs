//! HTTP utilities for Ops Manager REST API calls

use crate::error::ApiError;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log or report (to avoid leaking sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("om/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated, {} bytes total]", &body[..cut], body.len()),
        None => body.to_string(),
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Transport settings shared by every request
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub skip_ssl_validation: bool,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            skip_ssl_validation: false,
            request_timeout: Duration::from_secs(1800),
        }
    }
}

/// HTTP client wrapper for Ops Manager API calls
#[derive(Clone)]
pub struct OpsmanHttpClient {
    client: Client,
}

impl OpsmanHttpClient {
    /// Create a new HTTP client
    pub fn new(settings: &HttpSettings) -> Result<Self, ApiError> {
        if settings.skip_ssl_validation {
            tracing::warn!("TLS certificate validation is disabled");
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .danger_accept_invalid_certs(settings.skip_ssl_validation)
            .build()
            .map_err(|source| ApiError::Transport {
                url: String::new(),
                source,
            })?;

        Ok(Self { client })
    }

    /// Raw reqwest client, for requests that don't carry a bearer token
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request to the API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value, ApiError> {
        tracing::debug!("GET {}", url);
        send(self.client.get(url).bearer_auth(token), url).await
    }

    /// Make a multipart POST request (used for product uploads)
    pub async fn post_multipart(
        &self,
        url: &str,
        token: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ApiError> {
        tracing::debug!("POST {} (multipart)", url);
        send(self.client.post(url).bearer_auth(token).multipart(form), url).await
    }

    /// Make a DELETE request with query parameters
    pub async fn delete(&self, url: &str, token: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        tracing::debug!("DELETE {}", url);
        send(self.client.delete(url).bearer_auth(token).query(query), url).await
    }
}

/// Send a request, validate the status and decode the JSON body
pub(crate) async fn send(request: RequestBuilder, url: &str) -> Result<Value, ApiError> {
    let response = request.send().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        let body = sanitize_for_log(&body);
        tracing::error!("API error: {} - {}", status, body);
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    // Handle empty response
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

/// A short hint to print under an API error, keyed on the status code
pub fn hint_for_error(error: &ApiError) -> Option<&'static str> {
    match error.status()? {
        401 => Some("Authentication failed. Check --username/--password or --client-id/--client-secret."),
        403 => Some("Permission denied. The user needs an Ops Manager admin role."),
        404 => Some("Resource not found. Check the product name and --target."),
        409 => Some("Conflict. Another change may be in progress on Ops Manager."),
        422 => Some("Ops Manager rejected the request as invalid."),
        500 | 502 | 503 => Some("Ops Manager is temporarily unavailable. Please try again."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("bad\nrequest\t!"), "badrequest!");
    }

    #[test]
    fn test_sanitize_handles_multibyte_boundaries() {
        let body = "é".repeat(300);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }

    #[test]
    fn test_hint_for_status() {
        let err = ApiError::Status {
            url: String::new(),
            status: 401,
            body: String::new(),
        };
        assert!(hint_for_error(&err).unwrap().contains("Authentication"));
        assert!(hint_for_error(&ApiError::Auth("x".to_string())).is_none());
    }
}
