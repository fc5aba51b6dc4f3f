//! Ops Manager Authentication
//!
//! Acquires bearer tokens from the UAA embedded in Ops Manager, using either
//! the password grant or the client credentials grant.

use super::http::{send, OpsmanHttpClient};
use crate::error::ApiError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// UAA client used for the password grant
const OPSMAN_CLIENT_ID: &str = "opsman";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// How the client proves its identity to UAA
#[derive(Clone)]
pub enum Grant {
    Password { username: String, password: String },
    ClientCredentials { client_id: String, client_secret: String },
}

impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grant::Password { username, .. } => write!(f, "Password({username})"),
            Grant::ClientCredentials { client_id, .. } => write!(f, "ClientCredentials({client_id})"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Ops Manager credentials holder with token caching
#[derive(Clone)]
pub struct OpsmanCredentials {
    token_url: String,
    grant: Grant,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl OpsmanCredentials {
    pub fn new(token_url: String, grant: Grant) -> Self {
        Self {
            token_url,
            grant,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls, fetching a new one when the cached token expired
    pub async fn get_token(&self, http: &OpsmanHttpClient) -> Result<String, ApiError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|cached| cached.is_valid()) {
                return Ok(cached.token.clone());
            }
        }

        // Concurrent callers queue here, so only the first one asks UAA
        let mut cache = self.token_cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.token.clone());
            }
            tracing::debug!("Cached token expired, fetching new token");
        }

        let response = self.request_token(http).await?;
        let ttl = Duration::from_secs(response.expires_in.unwrap_or(0));
        *cache = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at: Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER),
        });

        tracing::debug!("New token cached, expires in ~{} seconds", ttl.as_secs());

        Ok(response.access_token)
    }

    async fn request_token(&self, http: &OpsmanHttpClient) -> Result<TokenResponse, ApiError> {
        tracing::debug!("POST {} ({:?})", self.token_url, self.grant);

        let request = match &self.grant {
            Grant::Password { username, password } => http
                .inner()
                .post(&self.token_url)
                .basic_auth(OPSMAN_CLIENT_ID, Some(""))
                .form(&[
                    ("grant_type", "password"),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                ]),
            Grant::ClientCredentials {
                client_id,
                client_secret,
            } => http
                .inner()
                .post(&self.token_url)
                .basic_auth(client_id, Some(client_secret))
                .form(&[("grant_type", "client_credentials")]),
        };

        let body = send(request.header("Accept", "application/json"), &self.token_url)
            .await
            .map_err(|err| match err {
                ApiError::Status { status, .. } => {
                    ApiError::Auth(format!("token request was rejected with status {status}"))
                }
                other => other,
            })?;

        serde_json::from_value(body)
            .map_err(|err| ApiError::Auth(format!("unexpected token response: {err}")))
    }
}
