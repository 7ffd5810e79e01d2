//! Configuration structures for a build run.
//!
//! [`BuildContext`] holds the paths, [`InstallerConfig`] the tunable values
//! from `installer.toml`, and [`DependencyDescriptor`] describes fetched
//! artifacts.

mod config;
mod context;
mod dependency;

pub use config::{
    ApplicationConfig, CONFIG_FILE_NAME, InstallerConfig, PackagerConfig, PruneConfig,
    RuntimeConfig,
};
pub use context::{BuildContext, INSTALLER_DIR_DEPTH};
pub use dependency::{DOWNLOAD_DIR_NAME, DependencyDescriptor, InstallMode};
