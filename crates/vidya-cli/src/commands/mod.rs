//! Command implementations

mod ask;
mod build;
mod chat;
mod config;
mod scan;
mod status;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match &cli.command {
        None | Some(Commands::Chat) => chat::execute(&cli, &output),
        Some(Commands::Ask(args)) => ask::execute(&cli, args, &output),
        Some(Commands::Build(args)) => build::execute(&cli, args, &output),
        Some(Commands::Scan) => scan::execute(&cli, &output),
        Some(Commands::Status) => status::execute(&cli, &output),
        Some(Commands::Config) => config::execute(&cli, &output),
    }
}
