//! LLM port definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use vidya_core::error::Result;

/// Port for embedding text into vector representations
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Slice of text strings to embed
    ///
    /// # Returns
    /// Vector of embedding vectors, one per input text, in input order
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get the dimensionality of embeddings produced by this embedder
    fn dimensions(&self) -> usize;

    /// Get the name/identifier of the embedding model
    fn model_name(&self) -> &str;

    /// Identifier recorded with an index built by this embedder.
    ///
    /// Hosted adapters return a `provider:model` spec so the recorded value
    /// can be passed back as `--embedder`.
    fn embedder_id(&self) -> String {
        self.model_name().to_string()
    }
}

/// Opaque handle a generator hands back so the next call can resume the
/// same conversation without resending it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One call to the generation capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Fixed behavioural instruction
    pub system_prompt: String,

    /// Context and question, already assembled
    pub user_message: String,

    /// Token from the previous turn, if any
    pub continuation: Option<ContinuationToken>,
}

/// Answer text plus the token that continues this conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub answer: String,
    pub continuation: Option<ContinuationToken>,
}

/// Port for text generation
pub trait Generator: Send + Sync {
    /// Generate an answer for a grounded prompt.
    ///
    /// Failures leave any server-side conversation untouched; the caller's
    /// previous token stays valid.
    fn generate(&self, request: &GenerationRequest) -> Result<Generation>;

    /// Get the name/identifier of the generation model
    fn model_name(&self) -> &str;
}
