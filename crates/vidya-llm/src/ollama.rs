use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use vidya_core::config::{Provider, ProviderSpec};
use vidya_core::error::{Result, VidyaError};

use crate::http::{BlockingClient, HttpFailure};
use crate::provider::measure_dimensions;
use crate::ports::{ContinuationToken, Embedder, Generation, GenerationRequest, Generator};

/// Dimensions of common Ollama embedding models
pub fn known_dimensions(model: &str) -> Option<usize> {
    let base = model.split(':').next().unwrap_or(model);
    match base {
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" => Some(1024),
        "all-minilm" => Some(384),
        "snowflake-arctic-embed" => Some(1024),
        "bge-m3" => Some(1024),
        _ => None,
    }
}

fn connect_remediation(base_url: &str, model: &str) -> String {
    format!(
        "Ensure Ollama is running at {} and the model '{}' is available. \
         Run 'ollama pull {}' to download the model.",
        base_url, model, model
    )
}

/// Ollama embedder implementation
pub struct OllamaEmbedder {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for embeddings
    model: String,

    /// Embedding dimensions (model-specific)
    dimensions: usize,

    http: BlockingClient,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Result<Self> {
        let http = BlockingClient::new().map_err(|e| VidyaError::EmbedderUnavailable {
            reason: e.to_string(),
            remediation: "Ensure the process can start an async runtime".to_string(),
        })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
            http,
        })
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        Self::new("http://localhost:11434", model, dimensions)
    }

    /// Create an embedder, asking the server for one embedding when the
    /// model's width is not in the known table
    pub fn detect(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        match known_dimensions(&model) {
            Some(dimensions) => Self::new(base_url, model, dimensions),
            None => {
                let mut embedder = Self::new(base_url, model, 0)?;
                embedder.dimensions = measure_dimensions(&embedder)?;
                Ok(embedder)
            }
        }
    }

    fn embedder_error(&self, failure: HttpFailure) -> VidyaError {
        match failure {
            HttpFailure::Status { status, body } => VidyaError::EmbedderUnavailable {
                reason: format!("Ollama API error ({}): {}", status, body),
                remediation: format!(
                    "Check that the model '{}' is available. Run 'ollama list' to see installed models.",
                    self.model
                ),
            },
            HttpFailure::Decode(reason) => VidyaError::EmbedderUnavailable {
                reason: format!("Failed to parse Ollama response: {}", reason),
                remediation: "Check Ollama API compatibility".to_string(),
            },
            other => VidyaError::EmbedderUnavailable {
                reason: format!("Failed to connect to Ollama: {}", other),
                remediation: connect_remediation(&self.base_url, &self.model),
            },
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let mut embeddings = Vec::with_capacity(texts.len());

        // The endpoint takes one prompt per request
        for text in texts {
            let request = OllamaEmbedRequest { model: &self.model, prompt: text };
            let response: OllamaEmbedResponse =
                self.http.post_json(&url, None, &request).map_err(|e| self.embedder_error(e))?;
            embeddings.push(response.embedding);
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn embedder_id(&self) -> String {
        ProviderSpec::new(Provider::Ollama, self.model.as_str()).to_string()
    }
}

/// Ollama chat generator.
///
/// `/api/chat` is stateless, so the adapter keeps each conversation's message
/// history in memory and hands out a fresh token per turn. A failed turn never
/// touches stored history.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    http: BlockingClient,
    conversations: Mutex<HashMap<ContinuationToken, Vec<ChatMessage>>>,
    next_turn: AtomicU64,
}

impl OllamaGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = BlockingClient::new().map_err(|e| VidyaError::GenerationFailed {
            reason: e.to_string(),
            remediation: "Ensure the process can start an async runtime".to_string(),
        })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http,
            conversations: Mutex::new(HashMap::new()),
            next_turn: AtomicU64::new(1),
        })
    }

    /// Messages to send for a request: stored history, then this turn
    fn messages_for(&self, request: &GenerationRequest) -> Result<Vec<ChatMessage>> {
        let history = match &request.continuation {
            Some(token) => {
                let conversations = self.lock_conversations()?;
                conversations.get(token).cloned().ok_or_else(|| VidyaError::GenerationFailed {
                    reason: format!("Unknown continuation token '{}'", token),
                    remediation: "Start a new conversation".to_string(),
                })?
            }
            None => vec![ChatMessage::new("system", &request.system_prompt)],
        };

        let mut messages = history;
        messages.push(ChatMessage::new("user", &request.user_message));
        Ok(messages)
    }

    /// Store the history of a successful turn under a fresh token.
    ///
    /// The superseded token is dropped, so one entry is kept per conversation.
    fn record_turn(
        &self,
        previous: Option<&ContinuationToken>,
        messages: Vec<ChatMessage>,
    ) -> Result<ContinuationToken> {
        let token = ContinuationToken::new(format!(
            "ollama-turn-{}",
            self.next_turn.fetch_add(1, Ordering::Relaxed)
        ));

        let mut conversations = self.lock_conversations()?;
        conversations.insert(token.clone(), messages);
        if let Some(previous) = previous {
            conversations.remove(previous);
        }

        Ok(token)
    }

    fn lock_conversations(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ContinuationToken, Vec<ChatMessage>>>> {
        self.conversations.lock().map_err(|_| VidyaError::GenerationFailed {
            reason: "Conversation store lock poisoned".to_string(),
            remediation: "Restart the session".to_string(),
        })
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let mut messages = self.messages_for(request)?;

        let body = OllamaChatRequest { model: &self.model, messages: &messages, stream: false };
        let response: OllamaChatResponse = self
            .http
            .post_json(&format!("{}/api/chat", self.base_url), None, &body)
            .map_err(|e| VidyaError::GenerationFailed {
                reason: format!("Ollama chat failed: {}", e),
                remediation: connect_remediation(&self.base_url, &self.model),
            })?;

        let answer = response.message.content.clone();
        messages.push(response.message);

        let token = self.record_turn(request.continuation.as_ref(), messages)?;

        Ok(Generation { answer, continuation: Some(token) })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama embeddings API
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self { role: role.to_string(), content: content.to_string() }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(continuation: Option<ContinuationToken>) -> GenerationRequest {
        GenerationRequest {
            system_prompt: "Use only the context.".to_string(),
            user_message: "Who wrote the report?".to_string(),
            continuation,
        }
    }

    #[test]
    fn test_ollama_embedder_creation() {
        let embedder = OllamaEmbedder::localhost("nomic-embed-text", 768).unwrap();
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_ollama_embedder_custom_url() {
        let embedder = OllamaEmbedder::new("http://custom:11434/", "test-model", 512).unwrap();
        assert_eq!(embedder.base_url, "http://custom:11434");
        assert_eq!(embedder.model_name(), "test-model");
        assert_eq!(embedder.dimensions(), 512);
    }

    #[test]
    fn test_known_dimensions_ignore_tag() {
        assert_eq!(known_dimensions("nomic-embed-text:latest"), Some(768));
        assert_eq!(known_dimensions("mxbai-embed-large"), Some(1024));
        assert_eq!(known_dimensions("llama3"), None);
    }

    #[test]
    fn test_unreachable_server_is_embedder_unavailable() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "nomic-embed-text", 768).unwrap();
        match embedder.embed(&["hello"]) {
            Err(VidyaError::EmbedderUnavailable { remediation, .. }) => {
                assert!(remediation.contains("ollama pull nomic-embed-text"));
            }
            other => panic!("expected EmbedderUnavailable, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_first_turn_starts_with_system_prompt() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();
        let messages = generator.messages_for(&request(None)).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::new("system", "Use only the context."));
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_continuation_replays_history() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();
        let token = ContinuationToken::new("ollama-turn-1");
        generator.conversations.lock().unwrap().insert(
            token.clone(),
            vec![
                ChatMessage::new("system", "Use only the context."),
                ChatMessage::new("user", "First question"),
                ChatMessage::new("assistant", "First answer"),
            ],
        );

        let messages = generator.messages_for(&request(Some(token))).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].content, "First answer");
        assert_eq!(messages[3].content, "Who wrote the report?");
    }

    #[test]
    fn test_unknown_token_is_generation_failure() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();
        let result = generator.generate(&request(Some(ContinuationToken::new("missing"))));
        assert!(matches!(result, Err(VidyaError::GenerationFailed { .. })));
    }

    #[test]
    fn test_failed_turn_stores_nothing() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();
        assert!(generator.generate(&request(None)).is_err());
        assert!(generator.conversations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_history_keeps_one_entry_per_conversation() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();

        let mut token: Option<ContinuationToken> = None;
        for turn in 0..10 {
            let mut messages = generator.messages_for(&request(token.clone())).unwrap();
            messages.push(ChatMessage::new("assistant", &format!("answer {}", turn)));
            token = Some(generator.record_turn(token.as_ref(), messages).unwrap());
        }

        let conversations = generator.conversations.lock().unwrap();
        assert_eq!(conversations.len(), 1);

        // system prompt plus ten question/answer pairs
        let latest = token.unwrap();
        assert_eq!(conversations[&latest].len(), 21);
    }

    #[test]
    fn test_failed_follow_up_keeps_previous_token() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3").unwrap();
        let messages = generator.messages_for(&request(None)).unwrap();
        let token = generator.record_turn(None, messages).unwrap();

        assert!(generator.generate(&request(Some(token.clone()))).is_err());
        assert!(generator.conversations.lock().unwrap().contains_key(&token));
    }
}
