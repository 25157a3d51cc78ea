//! Offline trigram embedder.
//!
//! Hashes character trigrams of each token into a fixed number of buckets
//! (signed feature hashing) and L2-normalizes the result. Not semantically
//! comparable to a neural model, so it cannot query an index built with one;
//! it serves offline development and tests.

use crate::embeddings::provider::EmbeddingProvider;
use ragchat_core::{AppError, AppResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Trigram-based embedding provider for local, offline operation.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Embedding(
                "Trigram embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn fnv1a(bytes: impl IntoIterator<Item = u8>) -> u64 {
        bytes.into_iter().fold(FNV_OFFSET, |hash, b| {
            (hash ^ b as u64).wrapping_mul(FNV_PRIME)
        })
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let hash = Self::fnv1a(feature.bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        // High bit picks the sign so collisions tend to cancel out
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            self.add_feature(&mut embedding, token, 1.0);

            let padded: Vec<char> = std::iter::once('^')
                .chain(token.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut embedding, &trigram, 0.5);
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.generate(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_dimensions_and_normalization() {
        let provider = TrigramProvider::new(384).unwrap();
        let embedding = provider.embed("admission deadlines for fall").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(384).unwrap();
        let a = provider.embed("hostel fee structure").await.unwrap();
        let b = provider.embed("hostel fee structure").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = TrigramProvider::new(384).unwrap();
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("goodbye world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(384).unwrap();
        let embedding = provider.embed("").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_input() {
        let provider = TrigramProvider::new(384).unwrap();
        let embedding = provider.embed("Café ☕ naïve façade").await.unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(TrigramProvider::new(0).is_err());
    }
}
