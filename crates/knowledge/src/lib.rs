//! Retrieval and answering for ragchat.
//!
//! Components, leaf first:
//! - [`embeddings`]: query embedders
//! - [`vector_index`] / [`pinecone`]: similarity search and match normalization
//! - [`context`]: bounded context assembly
//! - [`format`]: Markdown to HTML rendering
//! - [`rag`]: the query-to-answer pipeline
//! - [`app`]: the shared application context injected into the pipeline

pub mod app;
pub mod context;
pub mod embeddings;
pub mod format;
pub mod pinecone;
pub mod rag;
pub mod vector_index;

pub use app::AppContext;
pub use context::ContextBuilder;
pub use format::ResponseFormatter;
pub use pinecone::PineconeIndex;
pub use rag::{Answer, AnswerKind, Query, RagPipeline};
pub use vector_index::{normalize_matches, Match, VectorIndexClient};
