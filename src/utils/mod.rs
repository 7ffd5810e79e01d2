//! Shared helpers for staging the build tree.

pub mod fs;
