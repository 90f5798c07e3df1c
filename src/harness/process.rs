//! Synchronous child processes
//!
//! Every subprocess the harness starts goes through [`run_process`]. The
//! spawned child is owned by a guard that kills and reaps it when dropped, so
//! no exit path (error, timeout, panic) leaves a process behind.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::error::{HarnessError, HarnessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// What to do with the child's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutMode {
    /// Send it to the harness's stderr, keeping the harness's stdout for
    /// status lines (compiler diagnostics still reach the terminal)
    Forward,
    /// Read everything into [`ProcessOutput::stdout`]
    Capture,
}

/// Structured result of one finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured bytes; empty unless [`StdoutMode::Capture`] was used
    pub stdout: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Owns a running child. Dropping it without [`ChildGuard::wait`] kills the
/// child and reaps it.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child, reaped: false }
    }

    /// `Ok(None)` when the deadline passed with the child still running.
    fn wait(&mut self, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
        let Some(deadline) = deadline else {
            let status = self.child.wait()?;
            self.reaped = true;
            return Ok(Some(status));
        };

        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Make a relative path with no directory part executable by path rather than
/// by a `PATH` lookup (`add.exe` -> `./add.exe`).
pub fn runnable_path(path: &Path) -> PathBuf {
    let bare = path.is_relative() && path.parent().is_none_or(|p| p.as_os_str().is_empty());
    if bare {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

fn timed_out(program: &Path, limit: Duration) -> HarnessError {
    tracing::warn!(program = %program.display(), limit_secs = limit.as_secs_f64(), "timed out");
    HarnessError::Timeout {
        program: program.to_path_buf(),
        limit,
    }
}

fn reader_gone() -> HarnessError {
    HarnessError::Io(io::Error::other("stdout reader exited without a result"))
}

/// Run `program` with `args` to completion.
///
/// Stdin is always null. Stderr is inherited for compilers and discarded for
/// captured runs. With a `timeout`, the deadline covers both the child and
/// the end of its stdout: a child still running at the deadline is killed,
/// and a pipe still held open by something the child left behind is
/// abandoned. Either way [`HarnessError::Timeout`] is returned.
pub fn run_process<I, S>(
    program: &Path,
    args: I,
    stdout: StdoutMode,
    timeout: Option<Duration>,
) -> HarnessResult<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    match stdout {
        StdoutMode::Forward => {
            command.stdout(Stdio::from(io::stderr())).stderr(Stdio::inherit());
        }
        StdoutMode::Capture => {
            command.stdout(Stdio::piped()).stderr(Stdio::null());
        }
    }

    tracing::debug!(program = %program.display(), ?stdout, "spawning");
    let child = command.spawn().map_err(|source| HarnessError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;
    let mut guard = ChildGuard::new(child);
    let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));

    // Drain the pipe on its own thread so a chatty child never blocks on a
    // full pipe while we wait for it.
    let reader: Option<Receiver<io::Result<Vec<u8>>>> = guard.child.stdout.take().map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(pipe.read_to_end(&mut buf).map(|_| buf));
        });
        rx
    });

    let Some(status) = guard.wait(deadline)? else {
        drop(guard);
        return Err(timed_out(program, timeout.unwrap_or_default()));
    };

    // A background process started by the child can keep the pipe open after
    // the child exits; the reader is then left detached.
    let captured = match (reader, deadline) {
        (None, _) => Vec::new(),
        (Some(rx), None) => rx.recv().map_err(|_| reader_gone())??,
        (Some(rx), Some(deadline)) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => return Err(timed_out(program, timeout.unwrap_or_default())),
            Err(RecvTimeoutError::Disconnected) => return Err(reader_gone()),
        },
    };

    Ok(ProcessOutput {
        exit_code: status.code(),
        stdout: captured,
    })
}
