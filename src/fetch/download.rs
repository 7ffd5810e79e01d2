//! HTTP download of dependency installers.

use crate::error::{Error, ErrorExt, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Transfers a URL to a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` into `dest`. A failed transfer must not leave a file
    /// at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Streams downloads to disk with `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transfer(&self, url: &str, dest: &Path) -> Result<u64> {
        let download_error = |reason: String| Error::Download {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("server returned {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .fs_context("creating download file", dest)?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_error(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .fs_context("writing download file", dest)?;
            written += chunk.len() as u64;
        }
        file.flush().await.fs_context("flushing download file", dest)?;

        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        log::info!("Downloading {}", url);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating download directory", parent)?;
        }

        match self.transfer(url, dest).await {
            Ok(bytes) => {
                log::info!("Downloaded {} bytes to {}", bytes, dest.display());
                Ok(())
            }
            Err(e) => {
                // Never leave a partial file that a later run would treat as complete.
                crate::utils::fs::delete_if_exists(dest).await;
                Err(e)
            }
        }
    }
}
