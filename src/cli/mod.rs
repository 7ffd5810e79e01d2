//! Command line interface for the installer build.
//!
//! Resolves paths and configuration once, then hands them to the pipeline
//! runner.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::{
    pipeline::{Collaborators, PipelineRunner},
    settings::{BuildContext, InstallerConfig},
};
use anyhow::Context;

/// Main CLI entry point
///
/// Setup failures (bad arguments, paths, configuration) are returned as
/// errors; pipeline failures are reported by the runner and come back as a
/// non-zero exit code.
pub async fn run(args: Args) -> anyhow::Result<i32> {
    args.validate().map_err(anyhow::Error::msg)?;
    let output = OutputManager::new(args.verbose, args.quiet);

    let installer_dir = match &args.installer_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("reading current directory")?,
    };

    let build = BuildContext::from_installer_dir(&installer_dir)
        .context("resolving build paths")?;
    let config = InstallerConfig::load(args.config.as_deref(), &build)
        .await
        .context("loading configuration")?
        .with_signing_identity(args.signing_identity.clone());

    output.progress(&format!(
        "Building installer for {} (runtime {}-{})",
        build.tree_root().display(),
        config.runtime.name,
        config.runtime.version
    ));
    output.verbose(&format!("Build root: {}", build.build_root().display()));
    output.verbose(&format!("Dependency cache: {}", build.cache_dir().display()));

    let tools = Collaborators::system(args.packager.clone());
    let runner = PipelineRunner::new(&build, &config, &tools, output);
    Ok(runner.run().await)
}
