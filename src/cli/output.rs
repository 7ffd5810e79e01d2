//! Operator-facing console output.
//!
//! Progress goes to stdout, the abort notice to stderr. Quiet mode
//! suppresses everything except errors.

use std::io::Write;

/// Console printer shared by the CLI and the pipeline runner.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Prints nothing but errors.
    pub fn silent() -> Self {
        Self::new(false, true)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Detail shown only with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.is_verbose() {
            Self::out(&format!("  {message}"));
        }
    }

    pub fn progress(&self, message: &str) {
        if !self.quiet {
            Self::out(message);
        }
    }

    /// Step header.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            Self::out(&format!("==> {title}"));
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            Self::out(&format!("✓ {message}"));
        }
    }

    /// Always printed.
    pub fn error(&self, message: &str) {
        Self::err(&format!("✗ {message}"));
    }

    fn out(line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }

    fn err(line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}
