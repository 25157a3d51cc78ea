//! LLM integration crate for ragchat.
//!
//! This crate talks to a hosted chat-completion service and absorbs its
//! transient failures: rate limiting (429) with exponential backoff, oversized
//! payloads (413) by shrinking the context, and network errors by retrying.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ragchat_llm::{CompletionClient, CompletionSettings, OpenAiCompatTransport, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = OpenAiCompatTransport::new(
//!     "https://api.groq.com/openai/v1/chat/completions",
//!     "gsk-...",
//! )?;
//! let client = CompletionClient::new(
//!     Arc::new(transport),
//!     CompletionSettings::default(),
//!     RetryPolicy::default(),
//! );
//! let answer = client.complete("Rust was first released in 2015.", "When was Rust released?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod completion;
pub mod factory;
pub mod prompt;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRequest, ChatTransport, CompletionOutcome, Role};
pub use completion::{CompletionClient, CompletionError};
pub use factory::{create_client, create_transport};
pub use providers::OpenAiCompatTransport;
pub use types::{CompletionSettings, RetryPolicy};
