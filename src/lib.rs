#![doc = include_str!("../README.md")]

pub mod cli;
pub mod error;
pub mod fs;
pub mod plan;
pub mod steps;
pub mod verify;
pub mod wal;

pub use error::*;
pub use fs::{Batch, Executor, Operation};

pub fn run() -> Result<()> {
    use clap::Parser;
    use cli::Command;

    let cli = cli::Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Run(args) => steps::run::execute(args),
        Command::Inspect(args) => steps::inspect::execute(args),
    }
}
