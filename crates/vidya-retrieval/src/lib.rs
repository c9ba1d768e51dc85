//! Vidya Retrieval - Top-k retrieval and grounded conversation
//!
//! This crate answers questions against a loaded similarity index: it
//! retrieves the most similar units, assembles a grounded prompt and threads
//! the generator's continuation token from one turn to the next.

pub mod engine;
pub mod prompt;
pub mod session;

pub use engine::RetrievalEngine;
pub use session::{ConversationSession, ConversationState, Reply, SourceRef, UNAVAILABLE_MESSAGE};
