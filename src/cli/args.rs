//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Builds the RBTools Windows installer
#[derive(Parser, Debug)]
#[command(
    name = "build-installer",
    version,
    about = "Builds the RBTools Windows installer",
    long_about = "Fetches a portable Python runtime, installs RBTools into it, prunes unneeded \
files, compiles the installer with MSBuild and copies it to <tree>/dist.

Run without arguments from <tree>/contrib/installers/windows.

The first run may open the Python installer wizard; later runs reuse the
cached runtime and are unattended.

Exit code 0 = installer published; 1 = a step failed."
)]
pub struct Args {
    /// Installer directory (three levels below the project tree root)
    #[arg(long, value_name = "DIR", env = "INSTALLER_DIR")]
    pub installer_dir: Option<PathBuf>,

    /// Configuration file (default: <installer-dir>/installer.toml, if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Packager executable, bypassing the PATH search
    #[arg(long, value_name = "PATH", env = "INSTALLER_PACKAGER")]
    pub packager: Option<PathBuf>,

    /// Code signing certificate identity
    #[arg(long, value_name = "ID", env = "INSTALLER_SIGNING_IDENTITY")]
    pub signing_identity: Option<String>,

    /// Show debug logging and command output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.installer_dir {
            if !dir.is_dir() {
                return Err(format!("Installer directory does not exist: {}", dir.display()));
            }
        }
        if let Some(config) = &self.config {
            if !config.is_file() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }
        Ok(())
    }

    /// Default `env_logger` filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}
