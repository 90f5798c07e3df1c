#![forbid(unsafe_code)]
//! stagehand: golden-output test harness for two-stage compiler pipelines
//!
//! Test programs in a case directory are compiled by a domain compiler, then
//! by a native compiler; the resulting binaries are run and their stdout is
//! compared byte for byte against reference files.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod harness;
pub mod version;

pub use config::{CasePaths, HarnessConfig, StageCommand};
pub use harness::{CaseFailure, CaseOutcome, Harness, HarnessError, RunSummary};
