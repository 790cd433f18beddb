//! Reversible whole-file operations.
//!
//! Each [`Operation`] knows how to apply itself and how to reverse a previous
//! application. Paths are resolved to absolute form when the operation is
//! built and never change afterwards.
//!
//! ## Undo Semantics
//!
//! Undo inspects the filesystem rather than trusting that `apply()` ran to
//! completion, so it can be called on a step in any state:
//!
//! | Operation | Source | Target | Undo action                          |
//! |-----------|--------|--------|--------------------------------------|
//! | Move      | yes    | yes    | delete target                        |
//! | Move      | yes    | no     | nothing                              |
//! | Move      | no     | no     | nothing                              |
//! | Move      | no     | yes    | copy target back to source, delete it |
//! | Copy      | any    | yes    | delete target                        |
//! | Copy      | any    | no     | nothing (already undone)             |

use crate::error::{BatchError, Result};

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// A file system operation that can be applied and undone.
///
/// Serializes as `{"name": "move"|"copy", "source_path": ..., "target_path": ...}`,
/// which is the shape written to the batch log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Operation {
    /// Move a file.
    ///
    /// Implemented as copy followed by delete, so it works across filesystems.
    Move {
        source_path: PathBuf,
        target_path: PathBuf,
    },
    /// Copy a file, leaving the source untouched.
    Copy {
        source_path: PathBuf,
        target_path: PathBuf,
    },
}

impl Operation {
    /// Builds a move, resolving both paths against the working directory.
    pub fn move_file(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Self> {
        Ok(Operation::Move {
            source_path: resolve(source.as_ref())?,
            target_path: resolve(target.as_ref())?,
        })
    }

    /// Builds a copy, resolving both paths against the working directory.
    pub fn copy_file(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Self> {
        Ok(Operation::Copy {
            source_path: resolve(source.as_ref())?,
            target_path: resolve(target.as_ref())?,
        })
    }

    /// Stable tag identifying the operation kind.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Move { .. } => "move",
            Operation::Copy { .. } => "copy",
        }
    }

    pub fn source_path(&self) -> &Path {
        match self {
            Operation::Move { source_path, .. } | Operation::Copy { source_path, .. } => {
                source_path
            }
        }
    }

    pub fn target_path(&self) -> &Path {
        match self {
            Operation::Move { target_path, .. } | Operation::Copy { target_path, .. } => {
                target_path
            }
        }
    }

    /// Re-resolves both paths, for operations deserialized from a plan.
    pub fn resolved(self) -> Result<Self> {
        match self {
            Operation::Move {
                source_path,
                target_path,
            } => Operation::move_file(source_path, target_path),
            Operation::Copy {
                source_path,
                target_path,
            } => Operation::copy_file(source_path, target_path),
        }
    }

    /// Applies the operation.
    ///
    /// A `Move` that fails after the copy but before deleting the source
    /// leaves both files in place.
    ///
    /// Refuses with `InvalidInput` when source and target name the same file,
    /// including through `..`, symlinks or hard links.
    pub fn apply(&self) -> io::Result<()> {
        let (source, target) = (self.source_path(), self.target_path());

        match self {
            Operation::Move { .. } => {
                copy_contents(source, target, true)?;
                fs::remove_file(source).map_err(|e| annotate(e, "remove", source))?;
                log::debug!("Moved: {} → {}", source.display(), target.display());
            }
            Operation::Copy { .. } => {
                copy_contents(source, target, false)?;
                log::debug!("Copied: {} → {}", source.display(), target.display());
            }
        }

        Ok(())
    }

    /// Reverses a previous `apply()`.
    ///
    /// Safe to call whether `apply()` completed, stopped halfway, or never ran.
    pub fn undo(&self) -> io::Result<()> {
        let (source, target) = (self.source_path(), self.target_path());

        match self {
            Operation::Move { .. } => match (exists(source)?, exists(target)?) {
                (true, true) => {
                    // Copy finished but the source was never removed.
                    fs::remove_file(target).map_err(|e| annotate(e, "remove", target))?;
                    log::debug!("Removed partial move target: {}", target.display());
                }
                (true, false) | (false, false) => {
                    log::debug!("Nothing to undo for move {}", source.display());
                }
                (false, true) => {
                    copy_contents(target, source, true)?;
                    fs::remove_file(target).map_err(|e| annotate(e, "remove", target))?;
                    log::debug!("Moved back: {} → {}", target.display(), source.display());
                }
            },
            Operation::Copy { .. } => match fs::remove_file(target) {
                Ok(()) => log::debug!("Removed copy: {}", target.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("Copy target already absent: {}", target.display());
                }
                Err(e) => return Err(annotate(e, "remove", target)),
            },
        }

        Ok(())
    }
}

fn resolve(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| BatchError::PathResolution {
        path: path.to_path_buf(),
        source,
    })
}

fn exists(path: &Path) -> io::Result<bool> {
    path.try_exists().map_err(|e| annotate(e, "stat", path))
}

/// Returns true if both paths exist and refer to the same file.
pub(crate) fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if a == b {
        return Ok(true);
    }
    if !exists(a)? || !exists(b)? {
        return Ok(false);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let meta_a = fs::metadata(a).map_err(|e| annotate(e, "stat", a))?;
        let meta_b = fs::metadata(b).map_err(|e| annotate(e, "stat", b))?;
        Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
    }

    #[cfg(not(unix))]
    {
        let canon_a = fs::canonicalize(a).map_err(|e| annotate(e, "resolve", a))?;
        let canon_b = fs::canonicalize(b).map_err(|e| annotate(e, "resolve", b))?;
        Ok(canon_a == canon_b)
    }
}

/// Streams `from` into `to`, creating or truncating `to`.
///
/// With `sync` set the target is flushed to storage before returning, which
/// callers rely on before deleting the only other copy of the data.
fn copy_contents(from: &Path, to: &Path, sync: bool) -> io::Result<u64> {
    let mut reader = File::open(from).map_err(|e| annotate(e, "open", from))?;

    // Truncating `to` would wipe `from` if they are the same file.
    if same_file(from, to)? {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Source and target are the same file: {} and {}",
                from.display(),
                to.display()
            ),
        ));
    }

    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(to)
        .map_err(|e| annotate(e, "open", to))?;

    let bytes = io::copy(&mut reader, &mut writer).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to copy {} → {}: {}", from.display(), to.display(), e),
        )
    })?;

    if sync {
        writer.sync_all().map_err(|e| annotate(e, "sync", to))?;
    }

    Ok(bytes)
}

fn annotate(e: io::Error, action: &str, path: &Path) -> io::Error {
    io::Error::new(
        e.kind(),
        format!("Failed to {} {}: {}", action, path.display(), e),
    )
}
