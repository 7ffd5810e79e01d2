//! The eight build steps, in execution order.

use super::{Step, StepContext};
use crate::{
    error::{Context, Error, ErrorExt, Result},
    fetch::Fetcher,
    packager::{self, PackagerParams},
    process::{self, CommandSpec},
    toolchain::probe_version,
    utils::fs::{copy_file, delete_if_exists, ensure_absent, recursive_overwrite_copy},
};
use async_trait::async_trait;
use std::path::PathBuf;

/// The fixed step sequence of an installer build.
pub fn default_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(LocateToolchain),
        Box::new(FetchRuntime),
        Box::new(StageRuntime),
        Box::new(InstallApplication),
        Box::new(PruneRuntime),
        Box::new(QueryVersion),
        Box::new(BuildInstaller),
        Box::new(PublishArtifact),
    ]
}

/// Resolves the packager through the configured locator and logs its
/// version.
pub struct LocateToolchain;

#[async_trait]
impl Step for LocateToolchain {
    fn name(&self) -> &'static str {
        "locate-toolchain"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let toolchain = cx.tools.locator.locate()?;
        log::info!("Using packager {}", toolchain.packager().display());
        probe_version(&*cx.tools.runner, toolchain.packager()).await;
        cx.state.toolchain = Some(toolchain);
        Ok(())
    }
}

/// Makes sure the portable runtime is in the dependency cache.
pub struct FetchRuntime;

#[async_trait]
impl Step for FetchRuntime {
    fn name(&self) -> &'static str {
        "fetch-runtime"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let descriptor = cx.config.runtime_dependency(cx.build)?;
        let fetcher = Fetcher::new(&*cx.tools.downloader, &*cx.tools.installer);
        let path = fetcher.ensure_cached(&descriptor).await?;
        cx.state.runtime_path = Some(path);
        Ok(())
    }
}

/// Recreates the build root as a copy of the cached runtime.
pub struct StageRuntime;

#[async_trait]
impl Step for StageRuntime {
    fn name(&self) -> &'static str {
        "stage-runtime"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let runtime = cx
            .state
            .runtime_path
            .as_deref()
            .context("runtime path not resolved before staging")?;
        let build_root = cx.build.build_root();

        ensure_absent(build_root).await?;
        recursive_overwrite_copy(runtime, build_root).await?;
        log::info!("Staged {} into {}", runtime.display(), build_root.display());
        Ok(())
    }
}

/// Runs the application's release install with the staged interpreter.
pub struct InstallApplication;

#[async_trait]
impl Step for InstallApplication {
    fn name(&self) -> &'static str {
        "install-application"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let app = &cx.config.application;
        let spec = CommandSpec::new(cx.build.build_root().join(&app.interpreter))
            .args(&app.install_args)
            .current_dir(cx.build.tree_root());

        let output = cx.tools.runner.run(&spec).await?;
        if !output.success() {
            process::log_failure(&spec, &output);
            return Err(Error::Install {
                target: "application".into(),
                reason: output.status_text(),
            });
        }

        for line in output.output.lines() {
            log::debug!("  {}", line);
        }
        Ok(())
    }
}

/// Deletes the configured subpaths of the build root.
pub struct PruneRuntime;

#[async_trait]
impl Step for PruneRuntime {
    fn name(&self) -> &'static str {
        "prune-runtime"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        for relative in &cx.config.prune.paths {
            let path = cx.build.build_root().join(relative);
            ensure_absent(&path).await?;
            log::debug!("Pruned {}", relative.display());
        }
        Ok(())
    }
}

/// Asks the installed application for its version.
///
/// Stdout goes to a marker file in the stage directory, which is removed as
/// soon as it has been read.
pub struct QueryVersion;

#[async_trait]
impl Step for QueryVersion {
    fn name(&self) -> &'static str {
        "query-version"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let marker = cx.build.version_marker();
        delete_if_exists(&marker).await;

        let app = &cx.config.application;
        let spec = CommandSpec::new(cx.build.build_root().join(&app.interpreter))
            .args(&app.version_args)
            .current_dir(cx.build.tree_root())
            .stdout_to(&marker);

        let output = cx.tools.runner.run(&spec).await?;
        if !output.success() {
            process::log_failure(&spec, &output);
            delete_if_exists(&marker).await;
            return Err(Error::Install {
                target: "application".into(),
                reason: format!("version query failed with {}", output.status_text()),
            });
        }

        let contents = tokio::fs::read_to_string(&marker)
            .await
            .fs_context("reading version marker", &marker)?;
        delete_if_exists(&marker).await;

        let version = contents.lines().next().unwrap_or_default().trim().to_string();
        if version.is_empty() {
            return Err(Error::Install {
                target: "application".into(),
                reason: "version query printed nothing".into(),
            });
        }

        log::info!("Application version {}", version);
        cx.state.version = Some(version);
        Ok(())
    }
}

/// Compiles the installer into a freshly emptied stage directory, so only
/// this run's output can be published.
pub struct BuildInstaller;

#[async_trait]
impl Step for BuildInstaller {
    fn name(&self) -> &'static str {
        "build-installer"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let toolchain = cx
            .state
            .toolchain
            .as_ref()
            .context("toolchain not resolved before packaging")?;
        let version = cx
            .state
            .version
            .clone()
            .context("version not known before packaging")?;

        let pkg = &cx.config.packager;
        let params = PackagerParams {
            version,
            build_root: cx.build.build_root().to_path_buf(),
            output_path: cx.build.stage_dir().to_path_buf(),
            source_path: cx.build.installer_dir().join(&pkg.source),
            manifest: cx.build.installer_dir().join(&pkg.manifest),
            configuration: pkg.configuration.clone(),
            platform: pkg.platform.clone(),
            signing_identity: pkg.signing_identity.clone(),
            timestamp_url: pkg.timestamp_url.clone(),
        };

        ensure_absent(cx.build.stage_dir()).await?;
        packager::run_packager(&*cx.tools.runner, toolchain.packager(), &params).await
    }
}

/// Copies the produced installer to the destination directory.
///
/// No file matching the artifact pattern is a failure; the destination
/// directory is still created.
pub struct PublishArtifact;

#[async_trait]
impl Step for PublishArtifact {
    fn name(&self) -> &'static str {
        "publish-artifact"
    }

    async fn run(&self, cx: &mut StepContext<'_>) -> Result<()> {
        let dest_dir = cx.build.dest_dir();
        tokio::fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;

        let stage = cx.build.stage_dir();
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&stage.to_string_lossy()),
            cx.config.packager.artifact_pattern
        );

        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|e| Error::Fs {
                context: "matching artifacts".into(),
                path: e.path().to_path_buf(),
                error: std::io::Error::new(e.error().kind(), e.error().to_string()),
            })?;
            if path.is_file() {
                matches.push(path);
            }
        }

        if matches.is_empty() {
            return Err(Error::Packaging(format!(
                "no file matching {} in {}",
                cx.config.packager.artifact_pattern,
                stage.display()
            )));
        }

        for artifact in matches {
            let file_name = artifact
                .file_name()
                .context("artifact path has no file name")?;
            let target = dest_dir.join(file_name);
            copy_file(&artifact, &target).await?;
            log::info!("✓ Published {}", target.display());
            cx.state.published.push(target);
        }
        Ok(())
    }
}
