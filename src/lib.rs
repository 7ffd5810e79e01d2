//! Windows installer build orchestration for RBTools.
//!
//! This library provides the pieces of the installer build:
//! - dependency fetching with checksum verification ([`fetch`])
//! - an ordered, abort-on-first-failure step pipeline ([`pipeline`])
//! - idempotent staging helpers ([`utils::fs`])
//!
//! The `build-installer` binary wires them together.

pub mod cli;
pub mod error;
pub mod fetch;
pub mod packager;
pub mod pipeline;
pub mod process;
pub mod settings;
pub mod toolchain;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
