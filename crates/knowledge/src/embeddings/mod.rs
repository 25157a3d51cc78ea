//! Query embedding.
//!
//! Converts a question into the fixed-dimension vector the index was built
//! with. Embedding failures are not expected to be transient and are never
//! retried.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
