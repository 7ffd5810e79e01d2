//! Packaging toolchain discovery.
//!
//! The pipeline asks a [`ToolchainLocator`] once, before anything else runs.
//! [`PathToolchainLocator`] honours an explicit packager path and otherwise
//! searches `PATH` for MSBuild. [`probe_version`] reports what was found.

use crate::{
    error::{Error, Result},
    process::{CommandOutput, CommandRunner, CommandSpec},
};
use std::path::{Path, PathBuf};

/// Executable names tried, in order, when no explicit path is configured.
pub const PACKAGER_CANDIDATES: &[&str] = &["msbuild", "MSBuild.exe"];

/// Resolved toolchain used by the packaging step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    packager: PathBuf,
}

impl Toolchain {
    pub fn new(packager: impl Into<PathBuf>) -> Self {
        Self {
            packager: packager.into(),
        }
    }

    /// Packager executable.
    pub fn packager(&self) -> &Path {
        &self.packager
    }
}

/// Resolves where the packaging toolchain lives.
pub trait ToolchainLocator: Send + Sync {
    fn locate(&self) -> Result<Toolchain>;
}

/// Finds the packager from an explicit path or on `PATH`.
#[derive(Clone, Debug, Default)]
pub struct PathToolchainLocator {
    explicit: Option<PathBuf>,
}

impl PathToolchainLocator {
    /// `explicit` bypasses the `PATH` search; it must point at an existing file.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }
}

impl ToolchainLocator for PathToolchainLocator {
    fn locate(&self) -> Result<Toolchain> {
        let packager = match &self.explicit {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(Error::ToolchainNotFound(format!(
                    "configured packager {} does not exist",
                    path.display()
                )));
            }
            None => PACKAGER_CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok())
                .ok_or_else(|| {
                    Error::ToolchainNotFound(format!(
                        "none of {} found in PATH. Install Visual Studio Build Tools \
                         or pass --packager",
                        PACKAGER_CANDIDATES.join(", ")
                    ))
                })?,
        };

        log::debug!("Found packager at: {}", packager.display());
        Ok(Toolchain::new(packager))
    }
}

/// Asks the packager for its version.
///
/// Only informational: a probe that cannot run or exits non-zero is logged
/// and yields `None`.
pub async fn probe_version(runner: &dyn CommandRunner, packager: &Path) -> Option<String> {
    let spec = CommandSpec::new(packager).args(["-version", "-nologo"]);
    match runner.run(&spec).await {
        Ok(output) if output.success() => {
            let version = output.output.lines().last().unwrap_or_default().trim();
            if version.is_empty() {
                log::warn!("{} printed no version", packager.display());
                return None;
            }
            log::info!("✓ packager version {}", version);
            Some(version.to_string())
        }
        Ok(output) => {
            log::warn!(
                "Version probe of {} ended with {}",
                packager.display(),
                output.status_text()
            );
            None
        }
        Err(e) => {
            log::warn!("Version probe of {} could not start: {}", packager.display(), e);
            None
        }
    }
}
