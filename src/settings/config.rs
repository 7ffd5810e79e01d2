//! `installer.toml` configuration.
//!
//! Every field has a built-in default matching the RBTools installer, so the
//! file is optional. Relative paths are resolved against the installer
//! directory.
//!
//! ```toml
//! [runtime]
//! version = "2.7.18"
//! install_mode = "silent"
//!
//! [packager]
//! signing_identity = "0123456789ABCDEF"
//! ```

use super::{BuildContext, DependencyDescriptor, InstallMode};
use crate::error::{Error, ErrorExt, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name inside the installer directory.
pub const CONFIG_FILE_NAME: &str = "installer.toml";

/// Parsed `installer.toml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    pub runtime: RuntimeConfig,
    pub application: ApplicationConfig,
    pub prune: PruneConfig,
    pub packager: PackagerConfig,
}

/// Portable runtime to fetch.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub name: String,
    pub version: String,
    pub url: String,
    /// MD5 (32 hex digits) or SHA-256 (64 hex digits) of the download.
    pub checksum: String,
    pub install_mode: InstallMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "python".into(),
            version: "2.7.18".into(),
            url: "https://www.python.org/ftp/python/2.7.18/python-2.7.18.amd64.msi".into(),
            checksum: "a425c758d38f8e28b56f4724b499239a".into(),
            install_mode: InstallMode::Interactive,
        }
    }
}

/// How the application installs itself into the staged runtime.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Interpreter inside the build root used for install and version query.
    pub interpreter: PathBuf,
    /// Arguments for the release install, run from the tree root.
    pub install_args: Vec<String>,
    /// Arguments that make the installed application print its version.
    pub version_args: Vec<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python.exe"),
            install_args: vec!["setup.py".into(), "release".into(), "install".into()],
            version_args: vec![
                "-c".into(),
                "import rbtools; print(rbtools.get_package_version())".into(),
            ],
        }
    }
}

/// Subpaths of the build root removed before packaging.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PruneConfig {
    pub paths: Vec<PathBuf>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            paths: ["Doc", "tcl", "Tools", "Lib/idlelib", "Lib/lib-tk", "Lib/test"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// Packager invocation parameters.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Build manifest handed to the packager (relative to the installer dir).
    pub manifest: PathBuf,
    /// Installer sources referenced by the manifest.
    pub source: PathBuf,
    pub configuration: String,
    pub platform: String,
    /// Certificate identity used to sign the installer. Unsigned when absent.
    pub signing_identity: Option<String>,
    pub timestamp_url: String,
    /// File name pattern of the produced installer inside the stage directory.
    pub artifact_pattern: String,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("rbtools.sln"),
            source: PathBuf::from("wix"),
            configuration: "Release".into(),
            platform: "x64".into(),
            signing_identity: None,
            timestamp_url: "http://timestamp.digicert.com".into(),
            artifact_pattern: "RBTools-*.exe".into(),
        }
    }
}

impl InstallerConfig {
    /// Loads the configuration file, falling back to defaults when the
    /// default-location file does not exist.
    ///
    /// An explicitly requested file must exist.
    pub async fn load(explicit: Option<&Path>, ctx: &BuildContext) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = ctx.installer_dir().join(CONFIG_FILE_NAME);
                if !default_path.is_file() {
                    log::debug!(
                        "No {} in {}, using built-in defaults",
                        CONFIG_FILE_NAME,
                        ctx.installer_dir().display()
                    );
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading configuration", &path)?;
        let config = Self::parse(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.runtime.url.is_empty() {
            return Err(Error::Config("runtime.url must not be empty".into()));
        }
        if self.packager.artifact_pattern.is_empty() {
            return Err(Error::Config(
                "packager.artifact_pattern must not be empty".into(),
            ));
        }
        for path in &self.prune.paths {
            if path.is_absolute() || path.components().any(|c| c == std::path::Component::ParentDir) {
                return Err(Error::Config(format!(
                    "prune path {} must stay inside the build root",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// Descriptor of the portable runtime dependency.
    pub fn runtime_dependency(&self, ctx: &BuildContext) -> Result<DependencyDescriptor> {
        Ok(DependencyDescriptor::new(
            self.runtime.name.as_str(),
            self.runtime.version.as_str(),
            self.runtime.url.as_str(),
            self.runtime.checksum.as_str(),
            ctx.cache_dir(),
        )?
        .with_install_mode(self.runtime.install_mode))
    }

    /// Replaces the configured signing identity (command line or environment).
    pub fn with_signing_identity(mut self, identity: Option<String>) -> Self {
        if identity.is_some() {
            self.packager.signing_identity = identity;
        }
        self
    }
}
