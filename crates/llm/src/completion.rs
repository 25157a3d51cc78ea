//! Resilient completion client.
//!
//! One logical call walks a small state machine over [`CompletionOutcome`]s:
//!
//! - `Success` ends the call with the trimmed answer.
//! - `RateLimited` and `NetworkError` sleep `base * 2^attempt` and resend the
//!   request unchanged.
//! - `PayloadTooLarge` halves the context-char-limit (never below the floor),
//!   re-truncates the context from the tail and resends. A 413 received at the
//!   floor is fatal.
//! - `Fatal` and `InvalidResponse` end the call immediately.
//!
//! All three retryable kinds draw from one shared attempt counter. When the
//! counter has reached `max_retries`, the next retryable outcome ends the call
//! with [`CompletionError::RetriesExhausted`] instead of sleeping again.

use crate::client::{ChatRequest, ChatTransport, CompletionOutcome};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::types::{CompletionSettings, RetryPolicy};
use ragchat_core::text::{char_len, tail_chars};
use ragchat_core::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Terminal failure of a completion call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Non-retryable HTTP status
    #[error("completion service returned status {status}: {body}")]
    Fatal { status: u16, body: String },

    /// 413 received when the context was already at the floor
    #[error("payload too large even with context limited to {limit} characters")]
    PayloadAtFloor { limit: usize },

    /// Retry budget spent without a success
    #[error("no completion after {attempts} attempts (retry budget exhausted)")]
    RetriesExhausted { attempts: u32 },

    /// Success status but no usable answer in the body
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// True for the budget-exhausted state, false for fatal ones.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, CompletionError::RetriesExhausted { .. })
    }
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        AppError::Llm(err.to_string())
    }
}

/// Completion client with rate-limit backoff and payload shrinking.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    settings: CompletionSettings,
    policy: RetryPolicy,
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        settings: CompletionSettings,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            settings,
            policy,
        }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Ask the model to answer `question` from `context`.
    ///
    /// The context is first cut to the configured limit, keeping its tail.
    pub async fn complete(&self, context: &str, question: &str) -> Result<String, CompletionError> {
        let mut limit = self.settings.max_context_chars;
        let context = if char_len(context) > limit {
            tracing::info!(
                "Context too long ({} chars), truncating to {} chars",
                char_len(context),
                limit
            );
            tail_chars(context, limit)
        } else {
            context
        };

        let mut request = ChatRequest::new(
            &self.settings.model,
            SYSTEM_PROMPT,
            build_user_prompt(context, question),
            self.settings.max_tokens,
            self.settings.temperature,
        );

        let mut attempt: u32 = 0;
        loop {
            match self.transport.send(&request).await {
                CompletionOutcome::Success(content) => {
                    tracing::info!(
                        provider = self.transport.provider_name(),
                        attempts = attempt + 1,
                        "Received completion"
                    );
                    return Ok(content.trim().to_string());
                }
                CompletionOutcome::RateLimited => {
                    tracing::warn!("Completion service rate limited the request (429)");
                    self.backoff(&mut attempt).await?;
                }
                CompletionOutcome::NetworkError(message) => {
                    tracing::warn!("Network error talking to completion service: {}", message);
                    self.backoff(&mut attempt).await?;
                }
                CompletionOutcome::PayloadTooLarge => {
                    if limit <= self.settings.min_context_chars {
                        tracing::error!(limit, "Payload too large at minimum context size");
                        return Err(CompletionError::PayloadAtFloor { limit });
                    }
                    self.ensure_budget(attempt)?;

                    limit = (limit / 2).max(self.settings.min_context_chars);
                    tracing::warn!(
                        "Payload too large (413), shrinking context to {} chars (attempt {}/{})",
                        limit,
                        attempt + 1,
                        self.policy.max_retries
                    );
                    request.set_user_content(build_user_prompt(tail_chars(context, limit), question));
                    attempt += 1;
                }
                CompletionOutcome::Fatal { status, body } => {
                    tracing::error!(status, "Completion service returned a non-retryable error");
                    return Err(CompletionError::Fatal { status, body });
                }
                CompletionOutcome::InvalidResponse(message) => {
                    return Err(CompletionError::InvalidResponse(message));
                }
            }
        }
    }

    fn ensure_budget(&self, attempt: u32) -> Result<(), CompletionError> {
        if attempt >= self.policy.max_retries {
            tracing::error!(
                max_retries = self.policy.max_retries,
                "Retry budget exhausted"
            );
            return Err(CompletionError::RetriesExhausted {
                attempts: attempt + 1,
            });
        }
        Ok(())
    }

    /// Sleep for the current attempt's delay and consume one retry.
    async fn backoff(&self, attempt: &mut u32) -> Result<(), CompletionError> {
        self.ensure_budget(*attempt)?;

        let delay = self.policy.delay_for(*attempt);
        tracing::warn!(
            "Backing off for {:.1}s (attempt {}/{})",
            delay.as_secs_f64(),
            *attempt + 1,
            self.policy.max_retries
        );
        tokio::time::sleep(delay).await;
        *attempt += 1;
        Ok(())
    }
}
