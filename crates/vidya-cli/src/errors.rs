use console::style;
use std::fmt;
use std::path::Path;
use vidya_core::config::DEFAULT_CONFIG_FILE;
use vidya_core::VidyaError;
use vidya_llm::provider::OPENAI_API_KEY;

/// Error with remediation suggestions, printed to stderr
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Missing credential or other required setting
pub fn config_missing(key: &str) -> CliError {
    let error = CliError::new(format!("Missing required configuration: {}", key));

    if key == OPENAI_API_KEY {
        error
            .with_context("An OpenAI model is configured but no API key is available.")
            .with_suggestion(format!("Export it: export {}=\"sk-...\"", OPENAI_API_KEY))
            .with_suggestion(format!("Or add {}=... to a .env file in this directory", OPENAI_API_KEY))
            .with_suggestion("Or switch to a local model: --embedder ollama:nomic-embed-text --generator ollama:llama3.2")
            .with_help("Run: vidya config")
    } else {
        error.with_help("Run: vidya config")
    }
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion(format!("Check {} for typos", DEFAULT_CONFIG_FILE))
        .with_suggestion("Check VIDYA_* environment variables and command-line flags")
        .with_help("Run: vidya config")
}

/// Create error for an index that fails its integrity checks
pub fn index_corrupted(path: &Path, reason: &str) -> CliError {
    CliError::new("Persisted index is corrupted")
        .with_context(format!("The index failed its integrity checks.\n\nPath: {}\nReason: {}", path.display(), reason))
        .with_suggestion(format!("Delete the index directory: rm -r {}", path.display()))
        .with_suggestion("Or rebuild it: vidya build --force")
        .with_help("Run: vidya status")
}

/// Create error for an index built with another embedder
pub fn index_incompatible(expected: &str, found: &str, recorded: &str) -> CliError {
    CliError::new("Index was built with a different embedder")
        .with_context(format!(
            "Queries would be embedded with '{}' but the index holds '{}' vectors.",
            expected, found
        ))
        .with_suggestion(format!("Switch back to the recorded embedder: --embedder {}", recorded))
        .with_suggestion("Or delete the index directory and rebuild: vidya build --force")
        .with_help("Run: vidya status")
}

/// Create error for embedder not available
pub fn embedder_not_available(reason: &str, remediation: &str) -> CliError {
    CliError::new("Embedder not available")
        .with_context(format!("The embedding model could not be reached.\n\nError: {}", reason))
        .with_suggestion(remediation.to_string())
        .with_suggestion("Or use a different embedder: --embedder ollama:other-model")
        .with_help("Run: vidya config")
}

/// Map a library error to its user-facing form
pub fn from_vidya(error: &VidyaError) -> CliError {
    match error {
        VidyaError::ConfigMissing { key } => config_missing(key),
        VidyaError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        VidyaError::IndexCorrupted { path, reason } => index_corrupted(path, reason),
        VidyaError::IndexIncompatible { expected, found, recorded } => {
            index_incompatible(expected, found, recorded)
        }
        VidyaError::EmbedderUnavailable { reason, remediation } => {
            embedder_not_available(reason, remediation)
        }
        VidyaError::GenerationFailed { reason, remediation } => CliError::new("Generation failed")
            .with_context(format!("Error: {}", reason))
            .with_suggestion(remediation.to_string()),
        other => CliError::new(other.to_string()),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(vidya) = error.downcast_ref::<VidyaError>() {
        return from_vidya(vidya);
    }

    let message = error.to_string();

    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
            .with_suggestion("Or run with appropriate privileges")
    } else {
        CliError::new(message)
    }
}
