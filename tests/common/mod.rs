//! Shared fakes and fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use installer_build::{
    Error, Result,
    fetch::{DependencyInstaller, Downloader},
    pipeline::Collaborators,
    process::{CommandOutput, CommandRunner, CommandSpec},
    settings::{BuildContext, DOWNLOAD_DIR_NAME, InstallMode, InstallerConfig},
    toolchain::{Toolchain, ToolchainLocator},
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
pub const TEST_VERSION: &str = "5.0.1";

/// Event recorded for the packager's version probe.
pub const PROBE_EVENT: &str = "run msbuild -version";

/// Ordered record of every collaborator call.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Packager invocations other than the version probe.
pub fn packager_runs(log: &EventLog) -> usize {
    events(log)
        .iter()
        .filter(|e| e.starts_with("run msbuild") && e.as_str() != PROBE_EVENT)
        .count()
}

/// Writes fixed bytes instead of downloading.
pub struct FakeDownloader {
    pub content: Vec<u8>,
    pub fail: bool,
    pub log: EventLog,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.log.lock().unwrap().push(format!("download {url}"));
        if self.fail {
            return Err(Error::Download {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(dest, &self.content).unwrap();
        Ok(())
    }
}

/// Lays out a minimal Python runtime in the target directory.
pub struct FakeInstaller {
    pub log: EventLog,
}

#[async_trait]
impl DependencyInstaller for FakeInstaller {
    async fn install(&self, artifact: &Path, target_dir: &Path, _mode: InstallMode) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("install {}", artifact.file_name().unwrap().to_string_lossy()));
        populate_runtime(target_dir);
        Ok(())
    }
}

pub fn populate_runtime(dir: &Path) {
    for sub in ["Doc", "tcl", "Lib/test", "Lib/site-packages"] {
        std::fs::create_dir_all(dir.join(sub)).unwrap();
    }
    std::fs::write(dir.join("python.exe"), "MZ").unwrap();
    std::fs::write(dir.join("Doc/python.chm"), "docs").unwrap();
    std::fs::write(dir.join("Lib/os.py"), "").unwrap();
}

/// Behaviour knobs for [`ScriptedRunner`].
#[derive(Clone, Copy, Debug)]
pub struct RunnerScript {
    pub probe_exit: i32,
    pub install_exit: i32,
    pub version_exit: i32,
    pub packager_exit: i32,
    pub packager_writes_artifact: bool,
}

impl Default for RunnerScript {
    fn default() -> Self {
        Self {
            probe_exit: 0,
            install_exit: 0,
            version_exit: 0,
            packager_exit: 0,
            packager_writes_artifact: true,
        }
    }
}

/// Pretends to be the interpreter and the packager.
pub struct ScriptedRunner {
    pub script: RunnerScript,
    pub stage_dir: PathBuf,
    pub log: EventLog,
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let first_arg = spec
            .args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.log
            .lock()
            .unwrap()
            .push(format!("run {} {}", spec.program_name(), first_arg));

        if spec.program_name() == "msbuild" && first_arg == "-version" {
            return Ok(CommandOutput {
                code: Some(self.script.probe_exit),
                output: "17.9.8.16306".into(),
            });
        }

        let code = if spec.program_name() == "msbuild" {
            if self.script.packager_exit == 0 && self.script.packager_writes_artifact {
                std::fs::create_dir_all(&self.stage_dir).unwrap();
                std::fs::write(
                    self.stage_dir.join(format!("RBTools-{TEST_VERSION}.exe")),
                    "installer",
                )
                .unwrap();
            }
            self.script.packager_exit
        } else if let Some(marker) = &spec.stdout_file {
            std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
            std::fs::write(marker, format!("{TEST_VERSION}\r\n")).unwrap();
            self.script.version_exit
        } else {
            self.script.install_exit
        };

        Ok(CommandOutput {
            code: Some(code),
            output: if code == 0 { String::new() } else { "error: boom".into() },
        })
    }
}

/// Locator returning a fixed answer.
pub struct StaticLocator {
    pub found: bool,
}

impl ToolchainLocator for StaticLocator {
    fn locate(&self) -> Result<Toolchain> {
        if self.found {
            Ok(Toolchain::new("msbuild"))
        } else {
            Err(Error::ToolchainNotFound("msbuild not in PATH".into()))
        }
    }
}

/// A project tree in a temp dir, with its build context and default config.
pub struct Fixture {
    pub _dir: TempDir,
    pub build: BuildContext,
    pub config: InstallerConfig,
    pub log: EventLog,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let installer_dir = dir.path().join("rbtools/contrib/installers/windows");
        std::fs::create_dir_all(&installer_dir).unwrap();
        let build = BuildContext::from_installer_dir(&installer_dir).unwrap();

        let mut config = InstallerConfig::default();
        config.runtime.url = "https://downloads.example.com/python-2.7.18.msi".into();
        config.runtime.checksum = EMPTY_MD5.into();
        config.application.interpreter = PathBuf::from("python.exe");

        Self {
            _dir: dir,
            build,
            config,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn download_path(&self) -> PathBuf {
        self.build
            .cache_dir()
            .join(DOWNLOAD_DIR_NAME)
            .join("python-2.7.18.msi")
    }

    pub fn runtime_cache(&self) -> PathBuf {
        self.build.cache_dir().join("python-2.7.18")
    }

    pub fn collaborators(&self, toolchain_found: bool, script: RunnerScript) -> Collaborators {
        Collaborators {
            locator: Box::new(StaticLocator {
                found: toolchain_found,
            }),
            downloader: Box::new(FakeDownloader {
                content: Vec::new(),
                fail: false,
                log: Arc::clone(&self.log),
            }),
            installer: Box::new(FakeInstaller {
                log: Arc::clone(&self.log),
            }),
            runner: Arc::new(ScriptedRunner {
                script,
                stage_dir: self.build.stage_dir().to_path_buf(),
                log: Arc::clone(&self.log),
            }),
        }
    }
}
