//! Available products
//!
//! Upload, list and delete product binaries known to Ops Manager.

use super::client::OpsmanClient;
use crate::error::ApiError;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Size of each chunk read from the product file while streaming it
const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Shortest progress polling interval, `tokio::time::interval` rejects zero
const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(10);

/// Multipart field Ops Manager expects the product file in
const PRODUCT_FIELD: &str = "product[file]";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    #[serde(rename = "product_version")]
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct UploadProductInput {
    pub path: PathBuf,
    /// How often upload progress is reported
    pub polling_interval: Duration,
}

/// Called with `(bytes_sent, total_bytes)` while an upload is in flight
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

pub struct AvailableProductsService<'a> {
    client: &'a OpsmanClient,
}

impl<'a> AvailableProductsService<'a> {
    pub fn new(client: &'a OpsmanClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ProductInfo>, ApiError> {
        let path = self.client.available_products_path();
        let response = self.client.get(&path).await?;

        serde_json::from_value(response).map_err(|source| ApiError::Decode {
            url: self.client.api_url(&path).unwrap_or(path),
            source,
        })
    }

    pub async fn check_product_availability(&self, name: &str, version: &str) -> Result<bool, ApiError> {
        let products = self.list().await?;
        Ok(products
            .iter()
            .any(|product| product.name == name && product.version == version))
    }

    /// Delete one product version, or every unused product when `all` is set
    pub async fn delete(&self, name: &str, version: &str, all: bool) -> Result<(), ApiError> {
        let path = self.client.available_products_path();
        let query: Vec<(&str, &str)> = if all {
            Vec::new()
        } else {
            vec![("product_name", name), ("version", version)]
        };

        self.client.delete(&path, &query).await?;
        Ok(())
    }

    /// Stream a product file to Ops Manager, reporting progress every polling interval
    pub async fn upload(&self, input: &UploadProductInput, on_progress: ProgressCallback) -> Result<(), ApiError> {
        let io_error = |source| ApiError::Io {
            path: input.path.clone(),
            source,
        };

        let file = tokio::fs::File::open(&input.path).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();
        let file_name = input
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "product.pivotal".to_string());

        tracing::info!("Uploading {} ({} bytes)", input.path.display(), total);

        let sent = Arc::new(AtomicU64::new(0));
        let body = reqwest::Body::wrap_stream(read_chunks(file, sent.clone()));
        let url = self.client.api_url(&self.client.available_products_path())?;

        let part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let form = reqwest::multipart::Form::new().part(PRODUCT_FIELD, part);

        let token = self.client.get_token().await?;

        let reporter = tokio::spawn(report_progress(
            sent,
            total,
            input.polling_interval,
            on_progress.clone(),
        ));
        let result = self.client.http.post_multipart(&url, &token, form).await;
        reporter.abort();

        result?;
        on_progress(total, total);
        tracing::info!("Finished uploading {}", input.path.display());
        Ok(())
    }
}

fn read_chunks(
    file: tokio::fs::File,
    sent: Arc<AtomicU64>,
) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    futures::stream::try_unfold(file, move |mut file| {
        let sent = sent.clone();
        async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok::<_, std::io::Error>(None);
            }
            buf.truncate(read);
            sent.fetch_add(read as u64, Ordering::Relaxed);
            Ok(Some((buf, file)))
        }
    })
}

async fn report_progress(sent: Arc<AtomicU64>, total: u64, every: Duration, on_progress: ProgressCallback) {
    let mut ticker = tokio::time::interval(every.max(MIN_POLLING_INTERVAL));
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let current = sent.load(Ordering::Relaxed);
        tracing::debug!("Upload progress: {} of {} bytes", current, total);
        on_progress(current, total);
    }
}

/// Percentage of an upload, for display
pub fn percent(sent: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (sent.min(total) * 100) / total
}
