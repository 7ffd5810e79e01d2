//! Build context: every path the pipeline touches, computed once.

use crate::error::{Context, Error, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Number of directory levels between the tree root and the installer
/// directory (`<tree>/contrib/installers/windows`).
pub const INSTALLER_DIR_DEPTH: usize = 3;

/// Immutable set of paths for one build run.
///
/// Constructed at startup from the invocation directory and passed by
/// reference into every component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildContext {
    /// Root of the project tree being packaged.
    tree_root: PathBuf,
    /// Directory holding the packaging sources (`<tree>/contrib/installers/windows`).
    installer_dir: PathBuf,
    /// Staged runtime plus installed application.
    build_root: PathBuf,
    /// Packager output area.
    stage_dir: PathBuf,
    /// Final publish destination.
    dest_dir: PathBuf,
    /// Dependency cache, one directory per `name-version`.
    cache_dir: PathBuf,
}

impl BuildContext {
    /// Derives all paths from the installer directory.
    ///
    /// The tree root is [`INSTALLER_DIR_DEPTH`] levels above it. Scratch
    /// directories live under `<installer_dir>/build` and the final artifact
    /// is published to `<tree>/dist`.
    pub fn from_installer_dir(installer_dir: &Path) -> Result<Self> {
        let installer_dir = installer_dir
            .absolutize()
            .map_err(|e| Error::Config(format!("cannot resolve {}: {}", installer_dir.display(), e)))?
            .to_path_buf();

        let tree_root = installer_dir
            .ancestors()
            .nth(INSTALLER_DIR_DEPTH)
            .context(format!(
                "{} is not {} levels below a project tree",
                installer_dir.display(),
                INSTALLER_DIR_DEPTH
            ))?
            .to_path_buf();

        let build_dir = installer_dir.join("build");

        Ok(Self {
            build_root: build_dir.join("runtime"),
            stage_dir: build_dir.join("stage"),
            cache_dir: build_dir.join("deps"),
            dest_dir: tree_root.join("dist"),
            tree_root,
            installer_dir,
        })
    }

    /// Builds a context from explicit paths (used by tests and embedders).
    pub fn new(
        tree_root: PathBuf,
        installer_dir: PathBuf,
        build_root: PathBuf,
        stage_dir: PathBuf,
        dest_dir: PathBuf,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            tree_root,
            installer_dir,
            build_root,
            stage_dir,
            dest_dir,
            cache_dir,
        }
    }

    pub fn tree_root(&self) -> &Path {
        &self.tree_root
    }

    pub fn installer_dir(&self) -> &Path {
        &self.installer_dir
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Transient file the version query writes into.
    pub fn version_marker(&self) -> PathBuf {
        self.stage_dir.join("VERSION")
    }
}
