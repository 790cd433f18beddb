use crate::steps::inspect::InspectArgs;
use crate::steps::run::RunArgs;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "walbatch", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a plan of moves and copies, rolling back on the first failure.
    Run(RunArgs),
    /// Print the records stored in a batch log.
    Inspect(InspectArgs),
}

impl Cli {
    /// Log level implied by `-v` flags; `RUST_LOG` still takes precedence.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
