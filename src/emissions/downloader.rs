use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found (404): {0}")]
    NotFound(String),

    #[error("Server error (5xx): {0}")]
    ServerError(String),

    #[error("Failed to save download: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the emissions workbook when no local copy exists yet
pub struct SpreadsheetDownloader {
    client: Client,
}

impl SpreadsheetDownloader {
    pub fn new() -> Result<Self, DownloadError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
        })
    }

    /// Download `url` to `path` unless `path` already exists
    ///
    /// Returns `true` when a download happened.
    pub async fn ensure_local(&self, path: &Path, url: &str) -> Result<bool, DownloadError> {
        if path.exists() {
            debug!("{} already present, skipping download", path.display());
            return Ok(false);
        }

        info!("Downloading {} to {}", url, path.display());
        let bytes = self.download(url).await?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(true)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!("Downloaded {url} ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        } else if status.as_u16() == 404 {
            Err(DownloadError::NotFound(format!("{url} not found on server")))
        } else if status.is_server_error() {
            Err(DownloadError::ServerError(format!(
                "Server error {status} while downloading {url}"
            )))
        } else {
            Err(response
                .error_for_status()
                .err()
                .map(DownloadError::HttpError)
                .unwrap_or_else(|| DownloadError::ServerError(format!("Unexpected status {status}"))))
        }
    }
}
