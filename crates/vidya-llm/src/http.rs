//! Blocking JSON-over-HTTP plumbing shared by the adapters
//!
//! The adapters expose synchronous ports. Each one owns a single-threaded
//! tokio runtime and blocks on `reqwest` futures through it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Why an HTTP exchange failed, before adapter-specific remediation is attached
#[derive(Debug)]
pub(crate) enum HttpFailure {
    /// Could not build the runtime or client
    Setup(String),

    /// The request never got a response
    Connect(String),

    /// Non-success status with the response body
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    Decode(String),
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpFailure::Setup(reason) => write!(f, "client setup failed: {}", reason),
            HttpFailure::Connect(reason) => write!(f, "request failed: {}", reason),
            HttpFailure::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            HttpFailure::Decode(reason) => write!(f, "unexpected response: {}", reason),
        }
    }
}

pub(crate) struct BlockingClient {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
}

impl BlockingClient {
    pub(crate) fn new() -> Result<Self, HttpFailure> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HttpFailure::Setup(format!("failed to create async runtime: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpFailure::Setup(e.to_string()))?;

        Ok(Self { runtime, client })
    }

    /// POST `body` as JSON and decode the JSON response
    pub(crate) fn post_json<B, R>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<R, HttpFailure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.runtime.block_on(async {
            let mut request = self.client.post(url).json(body);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            let response =
                request.send().await.map_err(|e| HttpFailure::Connect(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(HttpFailure::Status { status: status.as_u16(), body });
            }

            response.json::<R>().await.map_err(|e| HttpFailure::Decode(e.to_string()))
        })
    }
}
