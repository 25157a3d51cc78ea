//! Process-wide application context.
//!
//! Holds the collaborators that are expensive to build and safe to share:
//! the query embedder, the vector index client and the completion client.
//! It is constructed once at start-up and injected into the pipeline, so
//! tests can substitute any part of it.

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::pinecone::PineconeIndex;
use crate::vector_index::VectorIndexClient;
use ragchat_core::config::{AppConfig, RetrievalConfig};
use ragchat_core::AppResult;
use ragchat_llm::CompletionClient;
use std::sync::Arc;

/// Shared, read-only collaborators of the answering pipeline.
#[derive(Clone)]
pub struct AppContext {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndexClient>,
    pub completion: CompletionClient,
    pub retrieval: RetrievalConfig,
}

impl AppContext {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexClient>,
        completion: CompletionClient,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            completion,
            retrieval,
        }
    }

    /// Build every collaborator from configuration.
    ///
    /// Fails when the configuration is invalid, the embedder is unusable, or
    /// the configured index does not exist or has the wrong dimension.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        tracing::info!(
            provider = %config.embedding.provider,
            model = %config.embedding.model,
            "Loading embedding model"
        );
        let mut embedding = config.embedding.clone();
        embedding
            .cache_dir
            .get_or_insert_with(|| config.ragchat_dir().join("models"));
        let embedder = create_provider(&embedding).await?;

        tracing::info!(index = %config.index.index_name, "Initializing vector index client");
        let index = PineconeIndex::connect(&config.index, embedder.dimensions()).await?;

        let completion = ragchat_llm::create_client(&config.completion, &config.retrieval)?;

        Ok(Self::new(
            embedder,
            Arc::new(index),
            completion,
            config.retrieval.clone(),
        ))
    }
}
