//! External process execution.
//!
//! Every collaborator the pipeline delegates to (runtime installer,
//! application installer, version query, packager) runs through a
//! [`CommandRunner`]. The system implementation waits for each child to exit
//! before returning; there is no timeout.

use crate::error::{Error, ErrorExt, Result};
use async_trait::async_trait;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};

/// A command to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// Redirect stdout into this file instead of capturing it.
    pub stdout_file: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdout_file: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    /// Program file name, for messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Printable command line, for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().map(|a| {
                let a = a.to_string_lossy();
                if a.contains(' ') {
                    format!("\"{a}\"")
                } else {
                    a.into_owned()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout followed by stderr (empty when stdout was redirected).
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human readable exit status.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command and waits for it to exit.
    ///
    /// Returns `Err` only if the process could not be started; a non-zero
    /// exit is reported in [`CommandOutput::code`].
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands with `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        log::debug!("Running: {}", spec.display());

        let mut command = tokio::process::Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let spawn_error = |error: std::io::Error| Error::CommandFailed {
            command: spec.program_name(),
            error,
        };

        if let Some(path) = &spec.stdout_file {
            let file = create_redirect(path)?;
            // `output()` would force stdout back to a pipe.
            let output = command
                .stdout(Stdio::from(file))
                .stderr(Stdio::piped())
                .spawn()
                .map_err(spawn_error)?
                .wait_with_output()
                .await
                .map_err(spawn_error)?;
            return Ok(to_output(output.status, Vec::new(), output.stderr));
        }

        let output = command.output().await.map_err(spawn_error)?;
        Ok(to_output(output.status, output.stdout, output.stderr))
    }
}

fn create_redirect(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).fs_context("creating output directory", parent)?;
    }
    std::fs::File::create(path).fs_context("creating output file", path)
}

fn to_output(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> CommandOutput {
    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr));
    CommandOutput {
        code: status.code(),
        output,
    }
}

/// Logs captured output of a failed command at error level.
pub fn log_failure(spec: &CommandSpec, output: &CommandOutput) {
    log::error!(
        "{} failed with {}",
        spec.program_name(),
        output.status_text()
    );
    for line in output.output.lines() {
        log::error!("  {}", line);
    }
}
