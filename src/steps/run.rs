//! Orchestration for the `run` subcommand.
//!
//! Loads a plan, checks it, asks for confirmation, then hands the batch to the
//! executor. All file system modifications go through the executor.

use crate::error::{BatchError, Result};
use crate::plan::Plan;
use crate::verify::{confirm_operation, display_path, preflight_checks, print_plan};

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Plan file listing the operations to run, in order
    pub plan: PathBuf,

    /// Log file to append to (overrides the plan's `wal_path`)
    #[arg(long, value_name = "PATH")]
    pub wal: Option<PathBuf>,

    /// Show the plan without writing the log or touching any file
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Skip interactive confirmation
    #[arg(long = "yes", short = 'y')]
    pub skip_confirmation: bool,

    /// Run even if the plan fails pre-flight simulation
    #[arg(long)]
    pub skip_preflight: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;

    let batch = Plan::load(&args.plan)?.into_batch(args.wal.as_deref())?;
    log::debug!(
        "Loaded {} operations from {}",
        batch.len(),
        args.plan.display()
    );

    if args.skip_preflight {
        log::warn!("Skipping pre-flight checks");
    } else {
        preflight_checks(&batch)?;
    }

    if args.dry_run {
        print_plan(&batch, &cwd);
        println!("\n{}", "DRY RUN - No changes will be made".yellow().bold());
        return Ok(());
    }

    if !confirm_operation(&batch, &cwd, args.skip_confirmation)? {
        println!("\n{}", "Operation cancelled.".yellow());
        return Err(BatchError::Cancelled);
    }

    match batch.execute_all() {
        Ok(stats) => {
            println!(
                "{} {} operation{} ({} move{}, {} cop{})",
                "✓ Batch complete:".green().bold(),
                stats.total,
                if stats.total == 1 { "" } else { "s" },
                stats.moves,
                if stats.moves == 1 { "" } else { "s" },
                stats.copies,
                if stats.copies == 1 { "y" } else { "ies" }
            );
            println!(
                "  {} {}",
                "Log:".bold(),
                display_path(batch.wal_path(), &cwd).dimmed()
            );
            Ok(())
        }
        Err(e) => {
            report_failure(&e, batch.wal_path(), &cwd);
            Err(e)
        }
    }
}

fn report_failure(err: &BatchError, wal_path: &Path, cwd: &Path) {
    if let BatchError::WalAppend { index, .. } = err {
        eprintln!(
            "{} step {} and every step before it remain applied; the log at {} lacks its record",
            "Warning:".red().bold(),
            index,
            display_path(wal_path, cwd)
        );
        return;
    }

    let Some(rollback) = err.rollback() else {
        return;
    };

    eprintln!("{}", "Batch failed, applied steps were rolled back.".yellow().bold());
    for idx in &rollback.undone {
        eprintln!("  {} step {} undone", "✓".green(), idx);
    }
    for failure in &rollback.failures {
        eprintln!("  {} {}", "✗".red().bold(), failure);
    }
    for warning in &rollback.log_warnings {
        eprintln!("  {} not logged: {}", "!".yellow(), warning);
    }

    if !rollback.is_clean() {
        eprintln!(
            "{} some steps could not be undone; see the log at {}",
            "Warning:".red().bold(),
            display_path(wal_path, cwd)
        );
    }
}
