//! Append-only batch log.
//!
//! The log is an audit trail: a manifest describing the whole batch, then one
//! status record per step outcome in the order steps happened.

pub mod record;
pub mod writer;

pub use record::{StepAction, WalRecord};
pub use writer::{RecordSink, WalWriter, read_records};
