//! Retrieval-augmented answering.
//!
//! Embeds the question, retrieves matches, bounds the context, asks the LLM
//! and renders the result.

pub mod pipeline;
pub mod types;

pub use pipeline::RagPipeline;
pub use types::{Answer, AnswerKind, Query};
