use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vidya_core::config::{CliConfigOverrides, ProviderSpec};

/// Vidya - Ask questions about your documents
#[derive(Parser, Debug)]
#[command(name = "vidya")]
#[command(about = "Grounded question answering over a folder of documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./vidya.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the documents to index
    #[arg(long, global = true)]
    pub source_dir: Option<PathBuf>,

    /// Directory where the index is persisted
    #[arg(long, global = true)]
    pub index_path: Option<PathBuf>,

    /// Embedding model as provider:model (e.g., ollama:nomic-embed-text)
    #[arg(long, global = true, value_parser = parse_spec)]
    pub embedder: Option<ProviderSpec>,

    /// Generation model as provider:model (e.g., openai:gpt-4o-mini)
    #[arg(long, global = true, value_parser = parse_spec)]
    pub generator: Option<ProviderSpec>,

    /// Number of passages retrieved per question
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Defaults to `chat`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Flags that take precedence over file and environment configuration
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            source_dir: self.source_dir.clone(),
            index_path: self.index_path.clone(),
            embedder: self.embedder.clone(),
            generator: self.generator.clone(),
            top_k: self.top_k,
        }
    }
}

fn parse_spec(s: &str) -> Result<ProviderSpec, String> {
    s.parse()
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive conversation (default)
    Chat,

    /// Ask a single question and exit
    Ask(AskArgs),

    /// Load or build the index and report on it
    Build(BuildArgs),

    /// Parse the source directory without embedding and report per file
    Scan,

    /// Show the persisted index manifest
    Status,

    /// Show effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question to answer
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl AskArgs {
    pub fn question(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Delete the persisted index and rebuild it from the source directory
    #[arg(long)]
    pub force: bool,

    /// Skip the confirmation prompt for --force
    #[arg(long, short = 'y')]
    pub yes: bool,
}
