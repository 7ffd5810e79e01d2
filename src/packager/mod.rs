//! Installer compilation.
//!
//! Drives MSBuild over the WiX solution that describes the installer. All
//! inputs are passed as `/p:` properties; the solution decides the artifact
//! name.

use crate::{
    error::{Error, ErrorExt, Result},
    process::{self, CommandRunner, CommandSpec},
};
use std::path::{Path, PathBuf};

/// Everything the packager needs for one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagerParams {
    /// Installer version, as reported by the installed application.
    pub version: String,
    /// Staged runtime with the application installed.
    pub build_root: PathBuf,
    /// Directory the packager writes the installer into.
    pub output_path: PathBuf,
    /// Installer sources (WiX fragments, images).
    pub source_path: PathBuf,
    /// Build manifest (solution or project file).
    pub manifest: PathBuf,
    pub configuration: String,
    pub platform: String,
    /// Certificate identity for signing; `None` builds unsigned.
    pub signing_identity: Option<String>,
    pub timestamp_url: String,
}

impl PackagerParams {
    /// Packager command line for `packager`.
    pub fn command(&self, packager: &Path) -> CommandSpec {
        let property = |name: &str, value: &dyn std::fmt::Display| format!("/p:{name}={value}");

        let mut spec = CommandSpec::new(packager)
            .arg(self.manifest.as_os_str())
            .arg("/nologo")
            .arg("/verbosity:minimal")
            .arg(property("Configuration", &self.configuration))
            .arg(property("Platform", &self.platform))
            .arg(property("Version", &self.version))
            .arg(property("BuildRoot", &self.build_root.display()))
            .arg(property("OutputPath", &self.output_path.display()))
            .arg(property("SourcePath", &self.source_path.display()));

        if let Some(identity) = &self.signing_identity {
            spec = spec
                .arg(property("SigningIdentity", identity))
                .arg(property("TimestampUrl", &self.timestamp_url));
        }

        spec
    }
}

/// Runs the packager and waits for it.
///
/// # Arguments
/// - `runner` - Process runner
/// - `packager` - Path to the packager executable
/// - `params` - Build parameters
///
/// # Errors
/// [`Error::Packaging`] when the packager exits non-zero.
pub async fn run_packager(
    runner: &dyn CommandRunner,
    packager: &Path,
    params: &PackagerParams,
) -> Result<()> {
    log::info!("Running packager for version {}...", params.version);

    if params.signing_identity.is_none() {
        log::warn!("No signing identity configured; the installer will be unsigned");
    }

    tokio::fs::create_dir_all(&params.output_path)
        .await
        .fs_context("creating installer output directory", &params.output_path)?;

    let spec = params.command(packager);
    let output = runner.run(&spec).await?;
    if !output.success() {
        process::log_failure(&spec, &output);
        return Err(Error::Packaging(format!(
            "{} exited with {}",
            spec.program_name(),
            output.status_text()
        )));
    }

    Ok(())
}
