//! Pre-flight checks performed before executing a batch.
//!
//! The batch is simulated in order against a virtual view of the filesystem,
//! so a step may rely on a file produced by an earlier step. Nothing is
//! modified.

use crate::error::{BatchError, Result};
use crate::fs::{Batch, Operation, operation::same_file};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Files created or removed by the steps simulated so far.
#[derive(Default)]
struct VirtualFs {
    overlay: HashMap<PathBuf, bool>,
}

impl VirtualFs {
    fn is_file(&self, path: &Path) -> bool {
        self.overlay
            .get(path)
            .copied()
            .unwrap_or_else(|| path.is_file())
    }

    fn apply(&mut self, op: &Operation) {
        self.overlay.insert(op.target_path().to_path_buf(), true);
        if let Operation::Move { source_path, .. } = op {
            self.overlay.insert(source_path.clone(), false);
        }
    }
}

/// Simulates the batch and rejects it if any step would fail.
///
/// # Checks Performed
///
/// 1. Source and target differ
/// 2. Neither path is the batch log
/// 3. Source is a regular file, on disk or produced by an earlier step
/// 4. Target is not a directory
/// 5. Target's parent directory exists
///
/// # Errors
///
/// Returns `Preflight` for the first step that fails a check.
pub fn preflight_checks(batch: &Batch) -> Result<()> {
    let mut vfs = VirtualFs::default();

    for (idx, op) in batch.operations().iter().enumerate() {
        let (source, target) = (op.source_path(), op.target_path());
        let reject = |reason: String| BatchError::Preflight { index: idx, reason };

        if same_file(source, target)? {
            return Err(reject(format!(
                "{} source and target are the same file: {}",
                op.name(),
                source.display()
            )));
        }

        if source == batch.wal_path() || target == batch.wal_path() {
            return Err(reject(format!(
                "{} touches the batch log {}",
                op.name(),
                batch.wal_path().display()
            )));
        }

        if !vfs.is_file(source) {
            return Err(reject(format!(
                "source is not a file at that point in the batch: {}",
                source.display()
            )));
        }

        if target.is_dir() {
            return Err(reject(format!(
                "target is a directory: {}",
                target.display()
            )));
        }

        match target.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => {
                return Err(reject(format!(
                    "target directory does not exist: {}",
                    target.display()
                )));
            }
        }

        if vfs.is_file(target) {
            log::info!("Step {} will overwrite {}", idx, target.display());
        }

        vfs.apply(op);
    }

    log::debug!("Preflight passed for {} operations", batch.len());
    Ok(())
}
