//! Dependency fetching with idempotent caching and integrity checks.
//!
//! [`Fetcher::ensure_cached`] is the single entry point:
//!
//! 1. If the descriptor's cache path exists, return it. Cached content is
//!    never re-verified.
//! 2. Download the URL to a temporary file next to the cache path, unless a
//!    file with that name survives from an earlier incomplete run.
//! 3. Verify the temporary file's digest. On mismatch fail with
//!    [`Error::Integrity`] and keep the file for inspection.
//! 4. Install into the cache path, then delete the temporary file.

pub mod checksum;
mod download;
mod installer;

pub use download::{Downloader, HttpDownloader};
pub use installer::{DependencyInstaller, MsiInstaller};

use crate::{
    error::{Error, ErrorExt, Result},
    settings::DependencyDescriptor,
    utils::fs::delete_if_exists,
};
use checksum::ChecksumKind;
use std::path::PathBuf;

/// Downloads, verifies and installs dependencies into the cache directory.
pub struct Fetcher<'a> {
    downloader: &'a dyn Downloader,
    installer: &'a dyn DependencyInstaller,
}

impl<'a> Fetcher<'a> {
    pub fn new(downloader: &'a dyn Downloader, installer: &'a dyn DependencyInstaller) -> Self {
        Self {
            downloader,
            installer,
        }
    }

    /// Returns the cache path of `descriptor`, fetching it first if needed.
    pub async fn ensure_cached(&self, descriptor: &DependencyDescriptor) -> Result<PathBuf> {
        let cache_path = descriptor.cache_path();
        if tokio::fs::try_exists(cache_path)
            .await
            .fs_context("checking dependency cache", cache_path)?
        {
            log::info!(
                "{} already cached at {}",
                descriptor.label(),
                cache_path.display()
            );
            return Ok(cache_path.to_path_buf());
        }

        // Reject a malformed checksum before spending time on the download.
        let kind = ChecksumKind::detect(descriptor.expected_checksum())?;
        let download_path = descriptor.download_path()?;

        if download_path.is_file() {
            log::info!(
                "Reusing earlier download {}",
                download_path.display()
            );
        } else {
            self.downloader
                .download(descriptor.url(), &download_path)
                .await?;
        }

        let computed = checksum::file_digest(&download_path, kind).await?;
        if !checksum::digests_match(&computed, descriptor.expected_checksum()) {
            log::error!(
                "Checksum mismatch for {}; leaving {} in place for inspection",
                descriptor.label(),
                download_path.display()
            );
            return Err(Error::Integrity {
                path: download_path,
                computed,
                expected: descriptor.expected_checksum().to_string(),
            });
        }
        log::debug!("{} checksum verified ({:?})", descriptor.label(), kind);

        self.installer
            .install(&download_path, cache_path, descriptor.install_mode())
            .await?;

        delete_if_exists(&download_path).await;
        log::info!(
            "✓ {} installed to {}",
            descriptor.label(),
            cache_path.display()
        );
        Ok(cache_path.to_path_buf())
    }
}
