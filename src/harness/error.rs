//! Harness-level errors
//!
//! These are infrastructure errors (a missing directory, an unreadable file,
//! a child that could not be started). Per-case verdicts are not errors; they
//! are [`CaseFailure`](super::CaseFailure) tags.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that occur while running the harness
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("case directory '{}' does not exist", .0.display())]
    MissingCaseDirectory(PathBuf),

    #[error("failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' did not finish within {}s", .program.display(), .limit.as_secs_f64())]
    Timeout { program: PathBuf, limit: Duration },

    #[error("I/O error on '{}': {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
