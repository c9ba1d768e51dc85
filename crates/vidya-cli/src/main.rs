//! Vidya CLI - Command-line interface
//!
//! Chat with a folder of documents, or manage the index built from it.

mod cli;
mod commands;
mod errors;
mod interactive;
mod output;
mod progress;
mod startup;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Secrets may live in a local .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            errors::from_anyhow(error).display();
            ExitCode::FAILURE
        }
    }
}
