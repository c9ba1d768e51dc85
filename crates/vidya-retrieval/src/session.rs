//! Multi-turn conversation over a retrieval engine
//!
//! The session keeps no question or answer text between turns; the only
//! state is the continuation token the generator handed back last.

use serde::Serialize;
use vidya_core::error::{Result, VidyaError};
use vidya_core::FileType;
use vidya_llm::{ContinuationToken, Generator};
use vidya_store::ScoredUnit;

use crate::engine::RetrievalEngine;
use crate::prompt::grounded_request;

/// Fixed reply when no index could be built
pub const UNAVAILABLE_MESSAGE: &str =
    "Sorry, the document system is not available. Add documents to the source directory and restart.";

/// Conversation continuity between turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    /// No successful turn yet
    #[default]
    Uninitialized,

    /// Holds the token from the latest successful turn
    Threaded(ContinuationToken),
}

impl ConversationState {
    pub fn token(&self) -> Option<&ContinuationToken> {
        match self {
            ConversationState::Uninitialized => None,
            ConversationState::Threaded(token) => Some(token),
        }
    }
}

/// Where a piece of supporting context came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub source_file: String,
    pub file_type: FileType,
    pub location: String,
    pub score: f32,
}

impl From<&ScoredUnit> for SourceRef {
    fn from(scored: &ScoredUnit) -> Self {
        let metadata = scored.unit.metadata();
        Self {
            source_file: metadata.source_file().to_string(),
            file_type: metadata.file_type(),
            location: metadata.location(),
            score: scored.score,
        }
    }
}

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Answer { text: String, sources: Vec<SourceRef> },
    Unavailable,
}

impl Reply {
    /// Text to show the user
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer { text, .. } => text,
            Reply::Unavailable => UNAVAILABLE_MESSAGE,
        }
    }
}

/// One conversation. Owned by the caller and disposed of when it ends.
pub struct ConversationSession {
    retrieval: Option<RetrievalEngine>,
    generator: Box<dyn Generator>,
    top_k: usize,
    state: ConversationState,
}

impl ConversationSession {
    /// Start a conversation; `retrieval` is `None` when no index exists
    pub fn new(retrieval: Option<RetrievalEngine>, generator: Box<dyn Generator>, top_k: usize) -> Self {
        Self { retrieval, generator, top_k, state: ConversationState::Uninitialized }
    }

    pub fn is_available(&self) -> bool {
        self.retrieval.is_some()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Answer `question`, advancing the conversation only on success
    pub fn ask(&mut self, question: &str) -> Result<Reply> {
        let (reply, state) = self.turn(question, &self.state)?;
        self.state = state;
        Ok(reply)
    }

    /// Answer `question` from `state` without touching the session.
    ///
    /// Returns the reply and the state that follows it. An unavailable
    /// system returns `Reply::Unavailable` and the state as given.
    pub fn turn(&self, question: &str, state: &ConversationState) -> Result<(Reply, ConversationState)> {
        let Some(retrieval) = &self.retrieval else {
            return Ok((Reply::Unavailable, state.clone()));
        };

        if question.trim().is_empty() {
            return Err(VidyaError::EmptyQuestion);
        }

        let results = retrieval.retrieve(question, self.top_k)?;
        let request = grounded_request(&results, question, state.token().cloned());

        let generation = self.generator.generate(&request)?;

        // A generator that hands back no token keeps the previous thread
        let next = match generation.continuation {
            Some(token) => ConversationState::Threaded(token),
            None => state.clone(),
        };

        let sources = results.iter().map(SourceRef::from).collect();
        Ok((Reply::Answer { text: generation.answer.trim().to_string(), sources }, next))
    }
}
