//! Error types for Vidya

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VidyaError {
    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Document errors
    #[error("Failed to extract {format} content: {reason}")]
    DocumentExtraction { format: String, reason: String },

    // Capability errors
    #[error("Embedder unavailable: {reason}. Try: {remediation}")]
    EmbedderUnavailable {
        reason: String,
        remediation: String,
    },

    #[error("Generation failed: {reason}. Try: {remediation}")]
    GenerationFailed {
        reason: String,
        remediation: String,
    },

    // Index errors
    #[error("Persisted index at {path} is corrupted: {reason}")]
    IndexCorrupted { path: PathBuf, reason: String },

    #[error("Index was built with embedder '{found}' but '{expected}' is configured")]
    IndexIncompatible {
        expected: String,
        found: String,

        /// Embedder identifier stored with the index
        recorded: String,
    },

    #[error("Embedding dimension mismatch: index has {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    // Conversation errors
    #[error("Question is empty")]
    EmptyQuestion,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VidyaError {
    /// Whether this error must abort startup rather than degrade to a message
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VidyaError::ConfigMissing { .. }
                | VidyaError::ConfigInvalid { .. }
                | VidyaError::IndexCorrupted { .. }
                | VidyaError::IndexIncompatible { .. }
        )
    }
}

impl From<serde_json::Error> for VidyaError {
    fn from(err: serde_json::Error) -> Self {
        VidyaError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VidyaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(VidyaError::ConfigMissing { key: "OPENAI_API_KEY".into() }.is_fatal());
        assert!(VidyaError::IndexIncompatible {
            expected: "a".into(),
            found: "b".into(),
            recorded: "b".into()
        }
        .is_fatal());
        assert!(!VidyaError::GenerationFailed {
            reason: "timeout".into(),
            remediation: "retry".into()
        }
        .is_fatal());
        assert!(!VidyaError::EmptyQuestion.is_fatal());
    }

    #[test]
    fn test_display_includes_remediation() {
        let err = VidyaError::EmbedderUnavailable {
            reason: "connection refused".into(),
            remediation: "start ollama".into(),
        };
        let message = err.to_string();
        assert!(message.contains("connection refused"));
        assert!(message.contains("start ollama"));
    }
}
