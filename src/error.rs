//! Error types for walbatch.
//!
//! All operations return `Result<T>` which aliases `Result<T, BatchError>`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from batch construction and execution.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A path could not be made absolute.
    #[error("Cannot resolve path '{}': {source}", .path.display())]
    PathResolution { path: PathBuf, source: io::Error },

    /// The log could not be opened, read, written or synced.
    #[error("Log file error at {}: {source}", .path.display())]
    Wal { path: PathBuf, source: io::Error },

    /// A log record could not be serialized.
    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    /// An operation failed and the steps before it were rolled back.
    ///
    /// `source` is always the failure of the step itself; anything that went
    /// wrong while undoing is carried in `rollback`.
    #[error("Step {index} ({name}) failed: {source}; {rollback}")]
    StepFailed {
        index: usize,
        name: &'static str,
        source: io::Error,
        rollback: RollbackReport,
    },

    /// A step was applied but its status record could not be written.
    ///
    /// The batch stops there. Applied steps, including `index`, stay applied.
    #[error("Step {index} applied but could not be logged, batch aborted without undo: {source}")]
    WalAppend {
        index: usize,
        source: Box<BatchError>,
    },

    /// The batch would fail when executed.
    #[error("Preflight rejected step {index}: {reason}")]
    Preflight { index: usize, reason: String },

    /// Plan file is malformed.
    #[error("Invalid plan: {0}")]
    Plan(String),

    /// User declined confirmation.
    ///
    /// Not a failure; used for control flow when the user cancels.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BatchError {
    /// Returns the rollback report for errors raised after execution began.
    pub fn rollback(&self) -> Option<&RollbackReport> {
        match self {
            BatchError::StepFailed { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}

/// An undo that could not be carried out.
#[derive(Debug)]
pub struct UndoFailure {
    pub index: usize,
    pub name: &'static str,
    pub source: io::Error,
}

impl fmt::Display for UndoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({}): {}", self.index, self.name, self.source)
    }
}

/// Outcome of the undo pass that follows a failed step.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// Indices that were undone, most recent first.
    pub undone: Vec<usize>,
    /// Undo actions that failed. Rollback continued past each of them.
    pub failures: Vec<UndoFailure>,
    /// Undo actions that succeeded but whose status record was not written.
    pub log_warnings: Vec<String>,
}

impl RollbackReport {
    /// Returns true if every attempted undo succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of steps the rollback attempted.
    pub fn attempted(&self) -> usize {
        self.undone.len() + self.failures.len()
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attempted = self.attempted();
        write!(
            f,
            "undid {} previously-applied step{}",
            attempted,
            if attempted == 1 { "" } else { "s" }
        )?;

        if !self.failures.is_empty() {
            let details: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
            write!(
                f,
                " with {} undo failure{} ({})",
                self.failures.len(),
                if self.failures.len() == 1 { "" } else { "s" },
                details.join("; ")
            )?;
        }

        if !self.log_warnings.is_empty() {
            write!(
                f,
                ", {} undo record{} not logged",
                self.log_warnings.len(),
                if self.log_warnings.len() == 1 { "" } else { "s" }
            )?;
        }

        Ok(())
    }
}

/// Result type alias for walbatch operations.
pub type Result<T> = std::result::Result<T, BatchError>;
