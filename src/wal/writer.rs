//! Durable, append-only log sink.
//!
//! Every append is a full open → write → sync → close cycle, so a record is
//! on storage before the executor touches the next file. Records are stored
//! one JSON object per line.

use crate::error::{BatchError, Result};
use crate::wal::WalRecord;

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Destination for batch log records.
///
/// The executor only talks to this trait, so callers can substitute their own
/// sink (an in-memory buffer in tests, for instance).
pub trait RecordSink {
    /// Persists one record. Must not return before the record is durable.
    fn append(&mut self, record: &WalRecord) -> Result<()>;

    /// Location reported in the manifest.
    fn location(&self) -> &Path;
}

/// File-backed [`RecordSink`].
#[derive(Debug, Clone)]
pub struct WalWriter {
    path: PathBuf,
}

impl WalWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn wal_error(&self, source: io::Error) -> BatchError {
        BatchError::Wal {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for WalWriter {
    fn append(&mut self, record: &WalRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.wal_error(e))?;

        file.write_all(&line).map_err(|e| self.wal_error(e))?;
        file.sync_all().map_err(|e| self.wal_error(e))?;

        log::trace!("Appended {} bytes to {}", line.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Reads every record from a log file, in order.
///
/// Used for audit display only; nothing in this crate re-executes a batch from
/// its log.
pub fn read_records(path: &Path) -> Result<Vec<WalRecord>> {
    let file = File::open(path).map_err(|source| BatchError::Wal {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }

    Ok(records)
}
