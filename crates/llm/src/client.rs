//! Chat-completion request types and the transport abstraction.
//!
//! A transport performs exactly one HTTP exchange and classifies the result
//! into a [`CompletionOutcome`]. Retrying, backoff and context shrinking are
//! the job of [`crate::CompletionClient`], never of a transport.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request, serialized as the OpenAI-compatible body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "groq/compound-mini")
    pub model: String,

    /// Ordered conversation; system message first, then the user prompt
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a request with a system message and a user message.
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens,
            temperature,
        }
    }

    /// Replace the content of the last user message.
    pub fn set_user_content(&mut self, content: impl Into<String>) {
        if let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::User)
        {
            message.content = content.into();
        }
    }

    /// Content of the last user message.
    pub fn user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Classified result of one exchange with the completion service.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// HTTP success; content of the first choice, untrimmed
    Success(String),

    /// HTTP 429
    RateLimited,

    /// HTTP 413
    PayloadTooLarge,

    /// Connection failure, timeout, or a body that could not be read
    NetworkError(String),

    /// Any other non-success status
    Fatal { status: u16, body: String },

    /// Success status with a body that is not a usable completion
    InvalidResponse(String),
}

/// Trait for completion transports.
///
/// Implementations must not retry; they report what happened once.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Get the provider name (e.g., "openai-compatible").
    fn provider_name(&self) -> &str;

    /// Send one request and classify the result.
    async fn send(&self, request: &ChatRequest) -> CompletionOutcome;
}
