//! Harness version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.

/// The stagehand version string (for example, `0.1.0`).
pub const STAGEHAND_VERSION: &str = env!("CARGO_PKG_VERSION");
