//! Error types for installer build operations.
//!
//! Every pipeline step reports failures through [`Error`]. The variants follow
//! the failure phases an operator cares about (toolchain discovery, download,
//! integrity, install, packaging, filesystem) so the abort notice can name
//! what went wrong without any structured output.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for installer build operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all installer build operations
#[derive(Error, Debug)]
pub enum Error {
    /// The packaging toolchain could not be resolved
    #[error("packaging toolchain not found: {0}")]
    ToolchainNotFound(String),

    /// Transfer of a dependency failed
    #[error("failed to download {url}: {reason}")]
    Download {
        /// URL that was being fetched
        url: String,
        /// Transport or HTTP status description
        reason: String,
    },

    /// A downloaded file does not match its expected digest
    #[error(
        "checksum mismatch for {}: computed {computed}, expected {expected}",
        path.display()
    )]
    Integrity {
        /// Downloaded file that failed verification (left in place)
        path: PathBuf,
        /// Digest computed from the file contents
        computed: String,
        /// Digest from the dependency descriptor
        expected: String,
    },

    /// An install routine (runtime or application) failed
    #[error("{target} install failed: {reason}")]
    Install {
        /// What was being installed
        target: String,
        /// Exit status or other description
        reason: String,
    },

    /// The packager failed or produced nothing usable
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// Staging or copy failure with operation context
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        /// Operation being performed
        context: String,
        /// Path the operation touched
        path: PathBuf,
        /// Underlying OS error
        #[source]
        error: std::io::Error,
    },

    /// Filesystem post-condition did not hold
    #[error("filesystem error: {0}")]
    Filesystem(String),

    /// A child process could not be started
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// Program that was being started
        command: String,
        /// Spawn error
        #[source]
        error: std::io::Error,
    },

    /// Invalid configuration file or value
    #[error("configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Directory traversal errors
    #[error("directory walk failed: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Glob pattern errors
    #[error("invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Path prefix errors
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// URL parsing errors
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors without further context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Short phase label used in the abort notice.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ToolchainNotFound(_) => "toolchain",
            Error::Download { .. } => "download",
            Error::Integrity { .. } => "integrity",
            Error::Install { .. } => "install",
            Error::Packaging(_) => "packaging",
            Error::Fs { .. }
            | Error::Filesystem(_)
            | Error::WalkDir(_)
            | Error::StripPrefix(_)
            | Error::IoError(_) => "filesystem",
            Error::CommandFailed { .. } => "process",
            Error::Config(_) | Error::Toml(_) | Error::Pattern(_) | Error::Url(_) => {
                "configuration"
            }
            Error::GenericError(_) => "internal",
        }
    }
}

/// Attaches operation and path context to IO results.
pub trait ErrorExt<T> {
    /// Wraps an `io::Error` into [`Error::Fs`].
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Converts a missing value into [`Error::GenericError`].
pub trait Context<T> {
    /// Adds a message describing what was expected.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}
