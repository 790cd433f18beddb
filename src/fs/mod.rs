//! File system operations with logged rollback support.
//!
//! Provides reversible file operations and the executor that applies them as
//! an all-or-nothing batch.

pub mod batch;
pub mod operation;

pub use batch::{Batch, BatchStats, Executor};
pub use operation::Operation;
