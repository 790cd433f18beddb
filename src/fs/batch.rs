//! Logged, all-or-nothing execution of file operations.
//!
//! A [`Batch`] is an ordered list of [`Operation`]s plus the path of the log
//! that records its progress.
//!
//! ## Execution Guarantees
//!
//! - **Ordering**: Steps run strictly one after another, in batch order
//! - **Durability**: Each record is synced to storage before the next step
//! - **Rollback**: On the first failure, applied steps are undone most-recent-first
//! - **Best effort undo**: A failed undo does not stop the remaining undos
//!
//! ## Phases
//!
//! 1. **Manifest**: Log the full operation list (nothing has been touched yet)
//! 2. **Apply**: Run each step, logging `executed` after it succeeds
//! 3. **Rollback** (on failure): Undo applied steps in LIFO order, logging `undone`
//! 4. **Done**: Log the terminal `batch is done` record
//!
//! ## Example
//!
//! ```no_run
//! # use walbatch::fs::{Batch, Operation};
//! # fn example() -> walbatch::error::Result<()> {
//! let batch = Batch::new(
//!     "wal.jsonl",
//!     vec![
//!         Operation::move_file("a", "b")?,
//!         Operation::copy_file("c", "d")?,
//!     ],
//! )?;
//!
//! batch.execute_all()?; // Applies everything, or undoes what it applied
//! # Ok(())
//! # }
//! ```

use crate::error::{BatchError, Result, RollbackReport, UndoFailure};
use crate::fs::Operation;
use crate::wal::{RecordSink, WalRecord, WalWriter};

use std::path::{Path, PathBuf};

/// An ordered group of operations and the log that records them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    wal_path: PathBuf,
    operations: Vec<Operation>,
}

impl Batch {
    /// Creates a batch, resolving the log path to absolute form.
    pub fn new(wal_path: impl AsRef<Path>, operations: Vec<Operation>) -> Result<Self> {
        let wal_path = wal_path.as_ref();
        let wal_path =
            std::path::absolute(wal_path).map_err(|source| BatchError::PathResolution {
                path: wal_path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            wal_path,
            operations,
        })
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Runs the batch against a file log at [`Batch::wal_path`].
    pub fn execute_all(&self) -> Result<BatchStats> {
        Executor::new(WalWriter::new(&self.wal_path)).execute(self)
    }

    /// Returns operation statistics.
    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::default();
        for op in &self.operations {
            match op {
                Operation::Move { .. } => stats.moves += 1,
                Operation::Copy { .. } => stats.copies += 1,
            }
        }
        stats.total = self.operations.len();
        stats
    }
}

/// Statistics about batch operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub moves: usize,
    pub copies: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutorState {
    /// Nothing written yet.
    Idle,
    /// Manifest is being written.
    LoggingManifest,
    /// Applying the step at this index.
    Applying(usize),
    /// Undoing the step at this index.
    Undoing(usize),
    /// Every step applied and the terminal record written.
    Succeeded,
    /// Rollback finished.
    Failed,
}

/// Drives a [`Batch`] through its log sink.
///
/// An executor runs exactly one batch. Reusing it afterwards is an error.
#[must_use = "Executor does nothing until execute() is called"]
pub struct Executor<S: RecordSink> {
    sink: S,
    state: ExecutorState,
}

impl<S: RecordSink> Executor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: ExecutorState::Idle,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns true if the last batch completed.
    pub fn is_succeeded(&self) -> bool {
        self.state == ExecutorState::Succeeded
    }

    /// Executes every operation in order.
    ///
    /// On failure, every step applied so far is undone in reverse order and
    /// the failure of the step itself is returned as the primary cause. If a
    /// step's `executed` record cannot be written the batch stops with
    /// `WalAppend` and nothing is undone.
    pub fn execute(&mut self, batch: &Batch) -> Result<BatchStats> {
        if self.state != ExecutorState::Idle {
            return Err(BatchError::Other(anyhow::anyhow!(
                "Executor already ran a batch"
            )));
        }

        self.state = ExecutorState::LoggingManifest;
        let manifest = WalRecord::BatchStart {
            wal_path: self.sink.location().to_path_buf(),
            commands: batch.operations.clone(),
        };
        if let Err(e) = self.sink.append(&manifest) {
            log::error!("Could not write batch manifest: {}", e);
            self.state = ExecutorState::Failed;
            return Err(e);
        }
        log::info!(
            "Batch manifest with {} operations written to {}",
            batch.len(),
            self.sink.location().display()
        );

        for (idx, op) in batch.operations.iter().enumerate() {
            self.state = ExecutorState::Applying(idx);

            if let Err(source) = op.apply() {
                log::warn!(
                    "Step {} ({}) failed, undoing {} applied step{}: {}",
                    idx,
                    op.name(),
                    idx,
                    if idx == 1 { "" } else { "s" },
                    source
                );
                let rollback = self.rollback(batch, idx);
                return Err(BatchError::StepFailed {
                    index: idx,
                    name: op.name(),
                    source,
                    rollback,
                });
            }
            log::info!(
                "Step {} ({}) executed: {} → {}",
                idx,
                op.name(),
                op.source_path().display(),
                op.target_path().display()
            );

            // Without the record the trail no longer matches the disk, so stop
            // here and leave every applied step in place.
            if let Err(e) = self.sink.append(&WalRecord::executed(idx, op)) {
                log::error!("Step {} applied but not logged, aborting batch: {}", idx, e);
                self.state = ExecutorState::Failed;
                return Err(BatchError::WalAppend {
                    index: idx,
                    source: Box::new(e),
                });
            }
        }

        // All steps are applied and logged; a failure here is reported but
        // leaves the changes in place.
        if let Err(e) = self.sink.append(&WalRecord::batch_done()) {
            log::error!("Batch applied but completion not logged: {}", e);
            self.state = ExecutorState::Failed;
            return Err(e);
        }
        self.state = ExecutorState::Succeeded;
        log::info!("Batch completed ({} operations)", batch.len());

        Ok(batch.stats())
    }

    /// Undoes steps `0..applied` in reverse order.
    fn rollback(&mut self, batch: &Batch, applied: usize) -> RollbackReport {
        let mut report = RollbackReport::default();

        for idx in (0..applied).rev() {
            self.state = ExecutorState::Undoing(idx);
            let op = &batch.operations[idx];

            if let Err(source) = op.undo() {
                log::error!("Undo of step {} ({}) failed: {}", idx, op.name(), source);
                report.failures.push(UndoFailure {
                    index: idx,
                    name: op.name(),
                    source,
                });
                continue;
            }
            report.undone.push(idx);
            log::info!("Step {} ({}) undone", idx, op.name());

            if let Err(e) = self.sink.append(&WalRecord::undone(idx, op)) {
                log::warn!("Undo of step {} not logged: {}", idx, e);
                report.log_warnings.push(format!("step {}: {}", idx, e));
            }
        }

        self.state = ExecutorState::Failed;
        if report.is_clean() {
            log::info!("Rollback completed");
        } else {
            log::error!("Rollback finished with {} failures", report.failures.len());
        }
        report
    }
}

impl<S: RecordSink> Drop for Executor<S> {
    fn drop(&mut self) {
        match self.state {
            ExecutorState::Applying(idx) | ExecutorState::Undoing(idx) => {
                log::warn!("Executor dropped mid-batch at step {}", idx);
            }
            _ => {}
        }
    }
}
