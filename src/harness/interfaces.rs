//! Harness I/O boundary interfaces
//!
//! The two operations that leave the process are abstracted behind traits:
//! - Running a compile stage (an external compiler)
//! - Executing a compiled binary and capturing its stdout
//!
//! The default implementations spawn real subprocesses through
//! [`run_process`]. Tests substitute recording fakes to observe which
//! collaborators a case reached.

use std::path::Path;
use std::time::Duration;

use crate::config::StageCommand;

use super::error::HarnessResult;
use super::process::{StdoutMode, run_process, runnable_path};

/// Exit status of one compile-stage invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileResult {
    /// `None` when the compiler was killed by a signal
    pub exit_code: Option<i32>,
}

impl CompileResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ============================================================================
// Stage Runner Interface
// ============================================================================

/// One subprocess-driven transformation step.
pub trait StageRunner {
    /// Name shown in progress lines and the stage error label.
    fn name(&self) -> String;

    /// Transform `input` into `output` and report the exit status.
    ///
    /// `Err` means the compiler could not be started at all; the driver
    /// treats it the same as a nonzero exit.
    fn compile(&self, input: &Path, output: &Path) -> HarnessResult<CompileResult>;
}

// ============================================================================
// Executor Interface
// ============================================================================

/// Run a compiled binary and capture what it printed.
pub trait Executor {
    /// Run `binary` with no arguments and no stdin; return its stdout bytes.
    ///
    /// The binary's exit status is not part of the verdict.
    fn execute(&self, binary: &Path) -> HarnessResult<Vec<u8>>;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Invokes `<program> <input> -o <output> <extra args...>`.
pub struct CommandStage {
    command: StageCommand,
}

impl CommandStage {
    pub fn new(command: StageCommand) -> Self {
        Self { command }
    }

    /// The full argument list for one invocation.
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        let mut args = vec![input.as_os_str().to_owned(), "-o".into(), output.as_os_str().to_owned()];
        args.extend(self.command.extra_args.iter().map(Into::into));
        args
    }
}

impl StageRunner for CommandStage {
    fn name(&self) -> String {
        self.command.display_name()
    }

    fn compile(&self, input: &Path, output: &Path) -> HarnessResult<CompileResult> {
        let result = run_process(
            &self.command.program,
            self.arguments(input, output),
            StdoutMode::Forward,
            None,
        )?;
        Ok(CompileResult {
            exit_code: result.exit_code,
        })
    }
}

/// Runs the produced binary directly, stdout captured, stderr discarded.
#[derive(Debug, Clone, Default)]
pub struct BinaryExecutor {
    timeout: Option<Duration>,
}

impl BinaryExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Executor for BinaryExecutor {
    fn execute(&self, binary: &Path) -> HarnessResult<Vec<u8>> {
        let program = runnable_path(binary);
        let output = run_process(&program, std::iter::empty::<&str>(), StdoutMode::Capture, self.timeout)?;
        tracing::debug!(binary = %binary.display(), exit_code = ?output.exit_code, bytes = output.stdout.len(), "executed");
        Ok(output.stdout)
    }
}
