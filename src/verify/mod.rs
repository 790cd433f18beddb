//! Validation and confirmation before a batch runs.

pub mod preflight;
pub mod prompt;

pub use preflight::preflight_checks;
pub use prompt::{confirm_operation, display_path, print_plan};
