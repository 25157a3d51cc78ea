//! Ollama embedding provider.
//!
//! Embeds queries through Ollama's local `/api/embeddings` endpoint, e.g. with
//! `all-minilm` (384 dimensions, the same family the index was built with).
//! Failures are not retried; an embedding error is fatal for the query.

use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use ragchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider; `base_url` defaults to the local Ollama daemon.
    pub fn new(base_url: Option<&str>, model: &str, dimensions: usize) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    /// Check that Ollama answers and the model produces the expected dimension.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn verify(&self) -> AppResult<()> {
        debug!("Verifying Ollama embedding model at {}", self.base_url);
        self.embed("connection check").await.map(|_| ()).map_err(|e| {
            AppError::Embedding(format!(
                "Ollama not usable at {}: {}. Ensure Ollama is running and run: ollama pull {}",
                self.base_url, e, self.model
            ))
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                body.embedding.len(),
                self.dimensions
            )));
        }

        Ok(body.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embed_posts_model_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(json!({"model": "all-minilm", "prompt": "fee deadline"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": vec![0.5f32; 4]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(Some(&server.uri()), "all-minilm", 4).unwrap();
        let embedding = provider.embed("fee deadline").await.unwrap();
        assert_eq!(embedding, vec![0.5; 4]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1, 0.2]})),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(Some(&server.uri()), "all-minilm", 384).unwrap();
        let err = provider.embed("text").await.unwrap_err();
        assert!(err.to_string().contains("Unexpected embedding dimensions"));
        assert!(provider.verify().await.is_err());
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": "model \"all-minilm\" not found"})),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(Some(&server.uri()), "all-minilm", 384).unwrap();
        let err = provider.embed("text").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("not found"));
    }
}
