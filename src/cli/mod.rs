//! CLI module for the stagehand harness
//!
//! Running `stagehand` with no arguments processes every case in `tests/`
//! with the default compilers. Every flag only overrides one field of
//! [`HarnessConfig`].
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! `execute` returns `CliResult<ExitCode>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::config::{HarnessConfig, StageCommand, math_library_flag};
use crate::harness::{ConsoleReporter, Harness};
use crate::version::STAGEHAND_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile, run and compare every test case in a directory
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(version = STAGEHAND_VERSION)]
#[command(about = "Golden-output test harness for two-stage compiler pipelines", long_about = None)]
pub struct Cli {
    /// Directory holding the case artifacts
    #[arg(long = "dir", value_name = "DIR", default_value = "tests")]
    pub case_directory: PathBuf,

    /// Suffix of the source files cases are discovered from
    #[arg(long, value_name = "SUFFIX", default_value = ".mat")]
    pub source_suffix: String,

    /// Suffix of the stage-1 output
    #[arg(long, value_name = "SUFFIX", default_value = ".c")]
    pub intermediate_suffix: String,

    /// Suffix of the stage-2 output
    #[arg(long, value_name = "SUFFIX", default_value = ".exe")]
    pub binary_suffix: String,

    /// Suffix of the reference files
    #[arg(long, value_name = "SUFFIX", default_value = ".test")]
    pub reference_suffix: String,

    /// Suffix of the captured-output files
    #[arg(long, value_name = "SUFFIX", default_value = ".out")]
    pub output_suffix: String,

    /// Stage-1 compiler: invoked as `<PROGRAM> <source> -o <intermediate>`
    #[arg(long, value_name = "PROGRAM", default_value = "./matlang2c")]
    pub domain_compiler: PathBuf,

    /// Stage-2 compiler: invoked as `<PROGRAM> <intermediate> -o <binary> -l<MATH_LIBRARY>`
    #[arg(long, value_name = "PROGRAM", default_value = "gcc")]
    pub native_compiler: PathBuf,

    /// Library passed to the native compiler as `-l<NAME>`
    #[arg(long, value_name = "NAME", default_value = "m")]
    pub math_library: String,

    /// Extra flag for the native compiler (repeatable)
    #[arg(long = "native-flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub native_flags: Vec<String>,

    /// Kill a test binary that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Only run cases whose name contains this keyword
    #[arg(short = 'k', value_name = "KEYWORD")]
    pub filter: Option<String>,

    /// Show compile progress and per-case timings
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored status output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Map the parsed flags onto a harness configuration.
    pub fn to_config(&self) -> CliResult<HarnessConfig> {
        // Every file name ends with "", which would turn each file into a case
        if self.source_suffix.is_empty() {
            return Err(CliError::failure("Error: --source-suffix must not be empty"));
        }

        let native = self.native_flags.iter().fold(
            StageCommand::new(&self.native_compiler).with_arg(math_library_flag(&self.math_library)),
            |cmd, flag| cmd.with_arg(flag.as_str()),
        );

        let mut config = HarnessConfig::new()
            .with_case_directory(&self.case_directory)
            .with_source_suffix(self.source_suffix.as_str())
            .with_intermediate_suffix(self.intermediate_suffix.as_str())
            .with_binary_suffix(self.binary_suffix.as_str())
            .with_reference_suffix(self.reference_suffix.as_str())
            .with_output_suffix(self.output_suffix.as_str())
            .with_domain_compiler(StageCommand::new(&self.domain_compiler))
            .with_native_compiler(native);

        if let Some(secs) = self.timeout {
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|_| CliError::failure(format!("Error: invalid --timeout '{}'", secs)))?;
            config = config.with_timeout(timeout);
        }

        Ok(config)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Run the harness and turn the summary into an exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.to_config()?;

    let mut harness = Harness::new(config);
    if let Some(keyword) = cli.filter {
        harness = harness.with_filter(keyword);
    }

    let mut reporter = ConsoleReporter::stdio(cli.verbose, !cli.no_color);
    let summary = harness
        .run(&mut reporter)
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Status lines and the summary are already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================
