//! Embedding provider trait and factory.

use crate::embeddings::providers::{FastEmbedProvider, OllamaProvider, TrigramProvider};
use ragchat_core::config::EmbedderConfig;
use ragchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for query embedders.
///
/// An embedder is built once at start-up and shared read-only by every query.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "fastembed", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate the embedding for one text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider based on configuration.
///
/// Network-backed providers are verified before they are returned.
pub async fn create_provider(config: &EmbedderConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "fastembed" => Ok(Arc::new(
            FastEmbedProvider::new(&config.model, config.dimensions, config.cache_dir.clone())
                .await?,
        )),

        "trigram" => Ok(Arc::new(TrigramProvider::new(config.dimensions)?)),

        "ollama" => {
            let provider =
                OllamaProvider::new(config.endpoint.as_deref(), &config.model, config.dimensions)?;
            provider.verify().await?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: fastembed, ollama, trigram",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let config = EmbedderConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[tokio::test]
    async fn test_default_is_minilm_via_fastembed() {
        let config = EmbedderConfig::default();
        assert_eq!(config.provider, "fastembed");
        assert_eq!(config.model, "all-MiniLM-L6-v2");

        // A wrong dimension is reported before any model download
        let err = create_provider(&EmbedderConfig {
            dimensions: 512,
            ..config
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbedderConfig {
            provider: "unknown".to_string(),
            ..Default::default()
        };

        let err = create_provider(&config).await.unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }
}
