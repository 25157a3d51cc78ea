//! Local sentence-transformer embedder (fastembed / ONNX runtime).
//!
//! Runs `all-MiniLM-L6-v2` in-process, the model the document index is built
//! with, so query vectors live in the same space as the stored ones. Model
//! files are fetched into the cache directory on first use.

use crate::embeddings::provider::EmbeddingProvider;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use async_trait::async_trait;
use ragchat_core::{AppError, AppResult};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// Model name used when none is configured.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Map a configured model name to the fastembed model and its dimensions.
pub fn resolve_model(name: &str) -> AppResult<(EmbeddingModel, usize)> {
    let short = name.trim().trim_start_matches("sentence-transformers/");
    match short.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        _ => Err(AppError::Embedding(format!(
            "Unsupported fastembed model: '{}'. Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5",
            name
        ))),
    }
}

/// In-process embedder backed by an ONNX sentence-transformer.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into `cache_dir` if needed.
    ///
    /// The configured dimensions must match the model; this is checked before
    /// anything is loaded.
    pub async fn new(
        model_name: &str,
        dimensions: usize,
        cache_dir: Option<PathBuf>,
    ) -> AppResult<Self> {
        let (model, native_dims) = resolve_model(model_name)?;
        if native_dims != dimensions {
            return Err(AppError::Embedding(format!(
                "Model '{}' produces {} dimensions, but {} are configured",
                model_name, native_dims, dimensions
            )));
        }

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        info!(model = model_name, "Loading local embedding model");
        let embedding = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| AppError::Embedding(format!("Model loading task failed: {}", e)))?
            .map_err(|e| {
                AppError::Embedding(format!("Failed to load model '{}': {}", model_name, e))
            })?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name: model_name.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(model = %self.model_name, text_len = text.len()))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let input = text.to_string();

        // Inference is CPU-bound; keep it off the async workers
        let mut embeddings = tokio::task::spawn_blocking(move || {
            let model = model
                .lock()
                .map_err(|_| AppError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(vec![input], None)
                .map_err(|e| AppError::Embedding(format!("Embedding inference failed: {}", e)))
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding task failed: {}", e)))??;

        let embedding = embeddings
            .pop()
            .ok_or_else(|| AppError::Embedding("Model returned no embedding".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        debug!("Generated {}-dim embedding", embedding.len());
        Ok(embedding)
    }
}
