//! Materializes a verified download into the dependency cache.

use crate::{
    error::{Error, Result},
    process::{self, CommandRunner, CommandSpec},
    settings::InstallMode,
};
use async_trait::async_trait;
use std::{path::Path, sync::Arc};

/// Installs a downloaded dependency into its cache directory.
#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    async fn install(&self, artifact: &Path, target_dir: &Path, mode: InstallMode) -> Result<()>;
}

/// Runs a Windows Installer package through `msiexec`.
///
/// Interactive mode shows the normal wizard (`/i`) and blocks until the
/// operator finishes it. Silent mode performs an administrative extraction
/// (`/a ... /qb`) which lays the files out without registering anything.
pub struct MsiInstaller {
    runner: Arc<dyn CommandRunner>,
}

impl MsiInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Builds the `msiexec` invocation for a package.
    pub fn command(artifact: &Path, target_dir: &Path, mode: InstallMode) -> CommandSpec {
        let action = match mode {
            InstallMode::Interactive => "/i",
            InstallMode::Silent => "/a",
        };

        let mut target = std::ffi::OsString::from("TARGETDIR=");
        target.push(target_dir.as_os_str());

        let spec = CommandSpec::new("msiexec")
            .arg(action)
            .arg(artifact.as_os_str())
            .arg(target);

        match mode {
            InstallMode::Interactive => spec,
            InstallMode::Silent => spec.arg("/qb"),
        }
    }
}

#[async_trait]
impl DependencyInstaller for MsiInstaller {
    async fn install(&self, artifact: &Path, target_dir: &Path, mode: InstallMode) -> Result<()> {
        if mode == InstallMode::Interactive {
            log::warn!(
                "The installer wizard for {} needs attention. Install into {}",
                artifact.display(),
                target_dir.display()
            );
        }

        let spec = Self::command(artifact, target_dir, mode);
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            process::log_failure(&spec, &output);
            return Err(Error::Install {
                target: artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "dependency".into()),
                reason: output.status_text(),
            });
        }

        if !target_dir.is_dir() {
            return Err(Error::Install {
                target: target_dir.display().to_string(),
                reason: "installer finished but the target directory does not exist".into(),
            });
        }
        Ok(())
    }
}
