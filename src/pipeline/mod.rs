//! Ordered build pipeline.
//!
//! The pipeline is a fixed list of named [`Step`]s sharing one
//! [`StepContext`]. [`PipelineRunner`] executes them in order and stops at the
//! first failure:
//!
//! ```text
//! Idle -> Running(1) -> ... -> Running(N) -> Done
//!              \________________/
//!                      | any failure
//!                      v
//!                  Aborted(k)
//! ```
//!
//! Nothing is rolled back on abort; a partially staged build root stays as
//! it is for inspection.

mod runner;
mod steps;

pub use runner::{PipelineReport, PipelineRunner, PipelineState};
pub use steps::{
    BuildInstaller, FetchRuntime, InstallApplication, LocateToolchain, PruneRuntime,
    PublishArtifact, QueryVersion, StageRuntime, default_steps,
};

use crate::{
    error::Result,
    fetch::{DependencyInstaller, Downloader, HttpDownloader, MsiInstaller},
    process::{CommandRunner, SystemCommandRunner},
    settings::{BuildContext, InstallerConfig},
    toolchain::{PathToolchainLocator, Toolchain, ToolchainLocator},
};
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc};

/// External capabilities the steps delegate to.
pub struct Collaborators {
    pub locator: Box<dyn ToolchainLocator>,
    pub downloader: Box<dyn Downloader>,
    pub installer: Box<dyn DependencyInstaller>,
    pub runner: Arc<dyn CommandRunner>,
}

impl Collaborators {
    /// Real implementations: `PATH`/explicit packager lookup, HTTP download,
    /// `msiexec`, and `tokio::process`.
    pub fn system(packager: Option<PathBuf>) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        Self {
            locator: Box::new(PathToolchainLocator::new(packager)),
            downloader: Box::new(HttpDownloader::new()),
            installer: Box::new(MsiInstaller::new(Arc::clone(&runner))),
            runner,
        }
    }
}

/// Values produced by one step and consumed by a later one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    pub toolchain: Option<Toolchain>,
    pub runtime_path: Option<PathBuf>,
    pub version: Option<String>,
    pub published: Vec<PathBuf>,
}

/// What a step sees while it runs.
pub struct StepContext<'a> {
    pub build: &'a BuildContext,
    pub config: &'a InstallerConfig,
    pub tools: &'a Collaborators,
    pub state: &'a mut RunState,
}

/// One named unit of work. Any error aborts the pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()>;
}
