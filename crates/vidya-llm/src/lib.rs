//! Vidya LLM - Embedding and generation ports
//!
//! This crate defines the ports for embedding and text generation,
//! along with HTTP adapters for OpenAI and Ollama.

mod http;
pub mod ollama;
pub mod openai;
pub mod ports;
pub mod provider;

// Re-export main types
pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use openai::{OpenAiEmbedder, OpenAiGenerator};
pub use ports::{ContinuationToken, Embedder, Generation, GenerationRequest, Generator};
pub use provider::{build_embedder, build_generator};
