//! OpenAI adapters: the embeddings API and the Responses API.
//!
//! Generation uses `previous_response_id` as the continuation token, so the
//! server holds the conversation and each turn only sends the new prompt.

use serde::{Deserialize, Serialize};
use vidya_core::config::{Provider, ProviderSpec};
use vidya_core::error::{Result, VidyaError};

use crate::http::{BlockingClient, HttpFailure};
use crate::provider::measure_dimensions;
use crate::ports::{ContinuationToken, Embedder, Generation, GenerationRequest, Generator};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Dimensions of the OpenAI embedding models, when known without a test request
pub fn known_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// Pull the `error.message` out of an OpenAI error body, if it has one
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn describe(failure: &HttpFailure) -> String {
    match failure {
        HttpFailure::Status { status, body } => {
            format!("OpenAI API returned {}: {}", status, error_detail(body))
        }
        other => format!("OpenAI {}", other),
    }
}

fn remediation(failure: &HttpFailure, model: &str) -> String {
    match failure {
        HttpFailure::Status { status: 401, .. } => {
            "Check that OPENAI_API_KEY holds a valid key".to_string()
        }
        HttpFailure::Status { status: 404, .. } => {
            format!("Check that the model '{}' exists and your key can access it", model)
        }
        HttpFailure::Status { status: 429, .. } => {
            "Rate limited or out of quota; wait and retry or check your billing".to_string()
        }
        _ => "Check your network connection and OPENAI_BASE_URL".to_string(),
    }
}

/// Embedder backed by `POST /embeddings`
pub struct OpenAiEmbedder {
    http: BlockingClient,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create an embedder for a model of known width
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let model = model.into();
        let http = BlockingClient::new().map_err(|e| VidyaError::EmbedderUnavailable {
            reason: e.to_string(),
            remediation: "Ensure the process can start an async runtime".to_string(),
        })?;

        Ok(Self { http, base_url: base_url.into(), api_key: api_key.into(), model, dimensions })
    }

    /// Create an embedder, embedding a sample string when the model's width is unknown
    pub fn detect(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let model = model.into();
        match known_dimensions(&model) {
            Some(dimensions) => Self::new(base_url, api_key, model, dimensions),
            None => {
                let mut embedder = Self::new(base_url, api_key, model, 0)?;
                embedder.dimensions = measure_dimensions(&embedder)?;
                Ok(embedder)
            }
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let request = EmbeddingRequest { model: &self.model, input: texts };
        let response: EmbeddingResponse = self
            .http
            .post_json(&format!("{}/embeddings", self.base_url), Some(&self.api_key), &request)
            .map_err(|e| VidyaError::EmbedderUnavailable {
                reason: describe(&e),
                remediation: remediation(&e, &self.model),
            })?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn embedder_id(&self) -> String {
        ProviderSpec::new(Provider::OpenAi, self.model.as_str()).to_string()
    }
}

/// Generator backed by `POST /responses`
pub struct OpenAiGenerator {
    http: BlockingClient,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http = BlockingClient::new().map_err(|e| VidyaError::GenerationFailed {
            reason: e.to_string(),
            remediation: "Ensure the process can start an async runtime".to_string(),
        })?;

        Ok(Self { http, base_url: base_url.into(), api_key: api_key.into(), model: model.into() })
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let body = ResponsesRequest::from_request(&self.model, request);

        tracing::debug!(
            model = %self.model,
            continued = request.continuation.is_some(),
            "requesting response"
        );

        let response: ResponsesResponse = self
            .http
            .post_json(&format!("{}/responses", self.base_url), Some(&self.api_key), &body)
            .map_err(|e| VidyaError::GenerationFailed {
                reason: describe(&e),
                remediation: remediation(&e, &self.model),
            })?;

        if let Some(error) = response.error {
            return Err(VidyaError::GenerationFailed {
                reason: format!("OpenAI response failed: {}", error.message),
                remediation: "Retry the question".to_string(),
            });
        }

        Ok(Generation {
            answer: response.output_text(),
            continuation: Some(ContinuationToken::new(response.id)),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// OpenAI API request/response types

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ResponsesRequest<'a> {
    fn from_request(model: &'a str, request: &'a GenerationRequest) -> Self {
        Self {
            model,
            input: vec![
                InputMessage { role: "system", content: &request.system_prompt },
                InputMessage { role: "user", content: &request.user_message },
            ],
            previous_response_id: request.continuation.as_ref().map(ContinuationToken::as_str),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    id: String,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesResponse {
    /// Concatenate every `output_text` part of every message item
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text.as_str())
            .collect()
    }
}
