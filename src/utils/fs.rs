//! File system utilities for staging.
//!
//! Provides idempotent deletion and recursive overwrite copies with
//! post-condition checks, so callers never have to trust an exit status alone.

use crate::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Removes a file or directory tree if it exists.
///
/// A path that is already absent counts as success. OS errors while removing a
/// present path are logged and suppressed; use [`ensure_absent`] when the
/// caller needs a clean slate.
pub async fn delete_if_exists(path: &Path) {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => {
            log::warn!("Could not stat {}: {}", path.display(), e);
            return;
        }
    };

    let removal = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match removal {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Deletes `path` and verifies that nothing is left behind.
pub async fn ensure_absent(path: &Path) -> Result<()> {
    delete_if_exists(path).await;

    if fs::try_exists(path)
        .await
        .fs_context("checking removal", path)?
    {
        return Err(Error::Filesystem(format!(
            "{} still exists after removal",
            path.display()
        )));
    }
    Ok(())
}

/// Recursively copies a directory into `to`, creating it as needed and
/// overwriting files that already exist there.
///
/// Hidden and system entries are copied like any other. Symlinks are
/// followed so the staged tree is self-contained. Fails on the first entry
/// that cannot be copied.
pub async fn recursive_overwrite_copy(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::Filesystem(format!(
            "{} is not a directory",
            from.display()
        )));
    }

    let from_owned = from.to_path_buf();
    let to_owned = to.to_path_buf();

    let copied = tokio::task::spawn_blocking(move || copy_tree(&from_owned, &to_owned))
        .await
        .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))??;

    if !to.is_dir() {
        return Err(Error::Filesystem(format!(
            "{} was not created by the copy",
            to.display()
        )));
    }

    log::debug!(
        "Copied {} files from {} to {}",
        copied,
        from.display(),
        to.display()
    );
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    std::fs::create_dir_all(to).fs_context("creating copy destination", to)?;

    let mut copied = 0;
    for entry in walkdir::WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
            }
            clear_readonly(&dest_path);
            std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Allows an existing read-only destination file to be overwritten.
fn clear_readonly(path: &Path) {
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            if let Err(e) = std::fs::set_permissions(path, permissions) {
                log::debug!("Could not clear read-only flag on {}: {}", path.display(), e);
            }
        }
    }
}

/// Copies a regular file, creating the destination's parent directories.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::Filesystem(format!(
            "{} is not a file",
            from.display()
        )));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;

    if !to.is_file() {
        return Err(Error::Filesystem(format!(
            "{} missing after copy",
            to.display()
        )));
    }
    Ok(())
}
