//! The `inspect` subcommand: prints the audit trail stored in a batch log.
//!
//! Read-only. The log is displayed, never replayed.

use crate::error::Result;
use crate::fs::Operation;
use crate::verify::display_path;
use crate::wal::{StepAction, WalRecord, read_records};

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Log file to read
    pub wal: PathBuf,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let records = read_records(&args.wal)?;
    log::debug!("Read {} records from {}", records.len(), args.wal.display());

    for line in render(&records, &cwd) {
        println!("{}", line);
    }
    Ok(())
}

/// Renders each record as one or more display lines.
pub fn render(records: &[WalRecord], base: &Path) -> Vec<String> {
    let describe = |op: &Operation| {
        format!(
            "{} {} → {}",
            op.name(),
            display_path(op.source_path(), base),
            display_path(op.target_path(), base)
        )
    };

    let mut lines = Vec::new();
    for record in records {
        match record {
            WalRecord::BatchStart { commands, .. } => {
                lines.push(format!(
                    "{} ({} operation{})",
                    "Batch started".bold().cyan(),
                    commands.len(),
                    if commands.len() == 1 { "" } else { "s" }
                ));
                for (idx, op) in commands.iter().enumerate() {
                    lines.push(format!("  {:>3}. {}", idx, describe(op).dimmed()));
                }
            }
            WalRecord::StatusUpdate { action, index, cmd } => {
                let marker = match action {
                    StepAction::Executed => "✓".green(),
                    StepAction::Undone => "↺".yellow(),
                    StepAction::BatchDone => "■".green().bold(),
                };
                match cmd {
                    Some(op) => lines.push(format!(
                        "  {} {} step {}: {}",
                        marker,
                        action,
                        index,
                        describe(op)
                    )),
                    None => lines.push(format!("  {} {}", marker, action)),
                }
            }
        }
    }
    lines
}
