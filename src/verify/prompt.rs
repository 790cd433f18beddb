//! Plan display and user confirmation before a batch runs.
//!
//! Automatically skipped with `--yes` or `--dry-run`.

use crate::error::Result;
use crate::fs::{Batch, Operation};

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Formats `path` relative to `base` with forward slashes.
pub fn display_path(path: &Path, base: &Path) -> String {
    let relative = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}

/// Prints the numbered list of steps and the log location.
pub fn print_plan(batch: &Batch, base: &Path) {
    println!("\n{}", "Batch Plan:".bold().cyan());
    println!(
        "  {} {}",
        "Log:".bold(),
        display_path(batch.wal_path(), base).dimmed()
    );

    if batch.is_empty() {
        println!("  {}", "No operations".yellow());
        return;
    }

    for (idx, op) in batch.operations().iter().enumerate() {
        let verb = match op {
            Operation::Move { .. } => "move".yellow(),
            Operation::Copy { .. } => "copy".cyan(),
        };
        println!(
            "  {:>3}. {} {} → {}",
            idx,
            verb,
            display_path(op.source_path(), base),
            display_path(op.target_path(), base).green()
        );
    }
}

/// Shows the plan and asks the user to confirm.
///
/// The plan is printed whenever the prompt is not skipped, even if stdin
/// cannot answer.
///
/// # Automatic Skip Conditions
///
/// - `skip` is set (`--yes` or `--dry-run`)
/// - stdin is not a terminal (declines, since nobody can answer)
///
/// # Returns
///
/// - `Ok(true)` if the user confirms or the prompt is skipped
/// - `Ok(false)` if the user declines
///
/// # Errors
///
/// Returns `Err` only on I/O errors reading stdin.
pub fn confirm_operation(batch: &Batch, base: &Path, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }

    print_plan(batch, base);
    println!();

    if !io::stdin().is_terminal() {
        log::warn!("Non-interactive terminal detected. Use --yes to confirm automatically.");
        return Ok(false);
    }

    print!("{} {} ", "Continue?".bold(), "(y/N)".dimmed());
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;

    let confirmed =
        response.trim().eq_ignore_ascii_case("y") || response.trim().eq_ignore_ascii_case("yes");

    if !confirmed {
        log::info!("Batch cancelled by user");
    }

    Ok(confirmed)
}
