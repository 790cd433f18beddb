//! Record shapes written to the batch log.

use crate::fs::Operation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What happened to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAction {
    #[serde(rename = "executed")]
    Executed,
    #[serde(rename = "undone")]
    Undone,
    /// Terminal marker for a batch whose every step was applied.
    #[serde(rename = "batch is done")]
    BatchDone,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepAction::Executed => "executed",
            StepAction::Undone => "undone",
            StepAction::BatchDone => "batch is done",
        })
    }
}

/// One line of the batch log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalRecord {
    /// Written once, before any operation runs.
    BatchStart {
        wal_path: PathBuf,
        commands: Vec<Operation>,
    },
    /// Written after each applied or undone step, and once at completion.
    StatusUpdate {
        action: StepAction,
        index: usize,
        cmd: Option<Operation>,
    },
}

impl WalRecord {
    pub fn executed(index: usize, op: &Operation) -> Self {
        WalRecord::StatusUpdate {
            action: StepAction::Executed,
            index,
            cmd: Some(op.clone()),
        }
    }

    pub fn undone(index: usize, op: &Operation) -> Self {
        WalRecord::StatusUpdate {
            action: StepAction::Undone,
            index,
            cmd: Some(op.clone()),
        }
    }

    pub fn batch_done() -> Self {
        WalRecord::StatusUpdate {
            action: StepAction::BatchDone,
            index: 0,
            cmd: None,
        }
    }

    /// Returns `(action, index)` for status records.
    pub fn status(&self) -> Option<(StepAction, usize)> {
        match self {
            WalRecord::StatusUpdate { action, index, .. } => Some((*action, *index)),
            WalRecord::BatchStart { .. } => None,
        }
    }
}
