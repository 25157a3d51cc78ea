//! OpenAI-compatible chat completions transport.
//!
//! Works against any service exposing `POST /chat/completions` with bearer
//! authentication (Groq, OpenAI, Ollama's `/v1` endpoint, vLLM).

use crate::client::{ChatRequest, ChatTransport, CompletionOutcome};
use ragchat_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Default per-attempt request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Chat completions response format (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP transport for OpenAI-compatible completion services.
pub struct OpenAiCompatTransport {
    /// Full chat completions URL
    endpoint: String,

    /// Bearer token
    api_key: String,

    /// HTTP client (carries the per-attempt timeout)
    client: reqwest::Client,
}

impl OpenAiCompatTransport {
    /// Create a transport with the default 30 second timeout.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_timeout(endpoint, api_key, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a transport with a custom per-attempt timeout.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Pull the first choice's content out of a success body.
    fn parse_body(body: &str) -> CompletionOutcome {
        let parsed: ChatCompletionResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return CompletionOutcome::InvalidResponse(format!(
                    "Failed to parse completion response: {}",
                    e
                ))
            }
        };

        match parsed.choices.into_iter().next() {
            Some(Choice {
                message: ChoiceMessage {
                    content: Some(content),
                },
            }) => CompletionOutcome::Success(content),
            Some(_) => CompletionOutcome::InvalidResponse(
                "First choice has no message content".to_string(),
            ),
            None => CompletionOutcome::InvalidResponse("Response has no choices".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenAiCompatTransport {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    async fn send(&self, request: &ChatRequest) -> CompletionOutcome {
        tracing::debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            "Sending chat completion request"
        );

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CompletionOutcome::NetworkError(e.to_string()),
        };

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => return CompletionOutcome::RateLimited,
            StatusCode::PAYLOAD_TOO_LARGE => return CompletionOutcome::PayloadTooLarge,
            _ => {}
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return CompletionOutcome::NetworkError(e.to_string()),
        };

        if !status.is_success() {
            return CompletionOutcome::Fatal {
                status: status.as_u16(),
                body,
            };
        }

        Self::parse_body(&body)
    }
}
