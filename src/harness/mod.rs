//! Golden-output harness for a two-stage compile pipeline
//!
//! ## Pipeline
//!
//! For every case found in the case directory:
//!
//! 1. Domain compiler: `<source> -o <intermediate>`
//! 2. Native compiler: `<intermediate> -o <binary> -l<mathlib>`
//! 3. Run the binary, capture stdout as bytes
//! 4. Write the bytes to the output artifact and compare with the reference
//!
//! A stage only runs if the previous one exited 0.
//!
//! ## Modules
//!
//! - `discovery` - Case names from the case directory
//! - `process` - Child processes with scoped cleanup and optional timeout
//! - `interfaces` - `StageRunner` / `Executor` traits and their subprocess impls
//! - `compare` - Output artifact + byte-exact comparison
//! - `driver` - Per-case state machine and batch loop
//! - `reporter` - `CaseReporter` trait and the console reporter

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod compare;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod interfaces;
pub mod process;
pub mod reporter;

pub use discovery::{CaseName, case_name, discover_cases};
pub use driver::{CaseFailure, CaseOutcome, CaseReport, Harness, RunSummary};
pub use error::{HarnessError, HarnessResult};
pub use interfaces::{BinaryExecutor, CommandStage, CompileResult, Executor, StageRunner};
pub use reporter::{CaseReporter, ConsoleReporter};
