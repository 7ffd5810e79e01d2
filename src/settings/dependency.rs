//! Dependency descriptors for fetched artifacts.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Subdirectory of the cache directory holding unverified downloads.
///
/// Cache entries are named `name-version`, so they never collide with it.
pub const DOWNLOAD_DIR_NAME: &str = "downloads";

/// How the fetched runtime installer is run.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Operator-attended wizard. The runtime's installer has no reliable
    /// unattended minimal install, so this is the default.
    #[default]
    Interactive,
    /// Administrative extraction with a basic progress UI only.
    Silent,
}

/// A named, versioned artifact to fetch, verify and install into the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyDescriptor {
    name: String,
    version: String,
    url: String,
    expected_checksum: String,
    cache_path: PathBuf,
    install_mode: InstallMode,
}

impl DependencyDescriptor {
    /// Creates a descriptor whose cache path is `cache_dir/<name>-<version>`.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
        expected_checksum: impl Into<String>,
        cache_dir: &Path,
    ) -> Result<Self> {
        let name = name.into();
        let version = version.into();
        if name.is_empty() || version.is_empty() {
            return Err(Error::Config(
                "dependency name and version must not be empty".into(),
            ));
        }
        if name.contains(['/', '\\']) || version.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "dependency {name}-{version} contains a path separator"
            )));
        }

        let cache_path = cache_dir.join(format!("{name}-{version}"));
        Ok(Self {
            name,
            version,
            url: url.into(),
            expected_checksum: expected_checksum.into(),
            cache_path,
            install_mode: InstallMode::default(),
        })
    }

    /// Sets the installer mode.
    pub fn with_install_mode(mut self, mode: InstallMode) -> Self {
        self.install_mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expected_checksum(&self) -> &str {
        &self.expected_checksum
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn install_mode(&self) -> InstallMode {
        self.install_mode
    }

    /// Temporary download location: the URL's file name under
    /// [`DOWNLOAD_DIR_NAME`] in the cache directory, stable across runs so an
    /// earlier download can be reused. Never equal to [`Self::cache_path`].
    pub fn download_path(&self) -> Result<PathBuf> {
        let parsed = url::Url::parse(&self.url)?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}.download", self.name, self.version));

        let cache_dir = self.cache_path.parent().unwrap_or(Path::new("."));
        Ok(cache_dir.join(DOWNLOAD_DIR_NAME).join(file_name))
    }

    /// Display label, e.g. `python-2.7.18`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}
