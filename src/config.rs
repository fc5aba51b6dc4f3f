//! Configuration Management
//!
//! Connection settings come from command line flags, `OM_*` environment
//! variables and a JSON file under the user config directory, in that order
//! of precedence. Passwords and client secrets are never written to disk.

use crate::opsman::{Grant, HttpSettings};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default request timeout, product uploads can take a long time
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 1800;

/// Persistent user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub skip_ssl_validation: Option<bool>,
    /// Request timeout in seconds
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

/// Values given on the command line, which win over everything else
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub target: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub skip_ssl_validation: bool,
    pub request_timeout: Option<u64>,
}

/// Fully resolved connection settings
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub target: String,
    pub grant: Grant,
    pub http: HttpSettings,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("om").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from disk, falling back to defaults when missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("Ignoring malformed config file {}: {}", path.display(), err);
                Self::default()
            }),
            Err(err) => {
                tracing::warn!("Could not read config file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine the user config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Merge values from another config, keeping ours where the other is unset
    pub fn merge(&mut self, other: Config) {
        self.target = other.target.or(self.target.take());
        self.username = other.username.or(self.username.take());
        self.client_id = other.client_id.or(self.client_id.take());
        self.skip_ssl_validation = other.skip_ssl_validation.or(self.skip_ssl_validation);
        self.request_timeout = other.request_timeout.or(self.request_timeout);
    }

    /// Resolve connection settings (CLI > environment > config file > defaults)
    pub fn resolve<F>(&self, cli: &ConnectionOverrides, env: F) -> Result<ConnectionSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: &Option<String>, var: &str, file: &Option<String>| {
            flag.clone()
                .or_else(|| env(var).filter(|v| !v.is_empty()))
                .or_else(|| file.clone())
        };

        let Some(target) = pick(&cli.target, "OM_TARGET", &self.target) else {
            bail!("No Ops Manager target configured. Set OM_TARGET or use --target");
        };

        let username = pick(&cli.username, "OM_USERNAME", &self.username);
        let password = pick(&cli.password, "OM_PASSWORD", &None);
        let client_id = pick(&cli.client_id, "OM_CLIENT_ID", &self.client_id);
        let client_secret = pick(&cli.client_secret, "OM_CLIENT_SECRET", &None);

        let grant = match (client_id, client_secret, username, password) {
            (Some(client_id), Some(client_secret), _, _) => Grant::ClientCredentials {
                client_id,
                client_secret,
            },
            (_, _, Some(username), Some(password)) => Grant::Password { username, password },
            _ => bail!(
                "No credentials configured. Use --username/--password or --client-id/--client-secret"
            ),
        };

        let skip_ssl_validation = cli.skip_ssl_validation
            || env("OM_SKIP_SSL_VALIDATION")
                .map(|v| parse_bool(&v))
                .transpose()?
                .or(self.skip_ssl_validation)
                .unwrap_or(false);

        let request_timeout = match cli.request_timeout {
            Some(secs) => secs,
            None => match env("OM_REQUEST_TIMEOUT") {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("OM_REQUEST_TIMEOUT must be a number of seconds, got {v:?}"))?,
                None => self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
        };

        Ok(ConnectionSettings {
            target,
            grant,
            http: HttpSettings {
                skip_ssl_validation,
                request_timeout: Duration::from_secs(request_timeout),
            },
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => bail!("Expected a boolean, got {other:?}"),
    }
}
