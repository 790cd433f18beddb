//! Plan files: the JSON description of a batch read by the CLI.
//!
//! A plan has the same shape as the `batch_start` log record, so a manifest
//! line copied out of a log is itself a valid plan:
//!
//! ```json
//! {
//!   "wal_path": "wal.jsonl",
//!   "commands": [
//!     {"name": "move", "source_path": "a", "target_path": "b"},
//!     {"name": "copy", "source_path": "c", "target_path": "d"}
//!   ]
//! }
//! ```

use crate::error::{BatchError, Result};
use crate::fs::{Batch, Operation};

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    /// Log destination. May be omitted when the caller supplies one.
    #[serde(default)]
    pub wal_path: Option<PathBuf>,
    pub commands: Vec<Operation>,
}

impl Plan {
    /// Reads and parses a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan {}", path.display()))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| BatchError::Plan(e.to_string()))
    }

    /// Builds a batch, resolving every path against the working directory.
    ///
    /// `wal_override` takes precedence over the plan's own `wal_path`.
    pub fn into_batch(self, wal_override: Option<&Path>) -> Result<Batch> {
        let wal_path = match (wal_override, self.wal_path) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(path)) => path,
            (None, None) => {
                return Err(BatchError::Plan(
                    "no wal_path in plan and no --wal given".to_string(),
                ));
            }
        };

        let operations = self
            .commands
            .into_iter()
            .map(Operation::resolved)
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Plan resolved to {} operations, log at {}",
            operations.len(),
            wal_path.display()
        );
        Batch::new(wal_path, operations)
    }
}
