//! Completion client settings.

use ragchat_core::config::{CompletionConfig, RetrievalConfig};
use ragchat_core::{AppError, AppResult};
use std::time::Duration;

/// Retry budget and backoff shape shared by every retryable failure kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total retries allowed across rate limits, shrinks and network errors
    pub max_retries: u32,

    /// Delay before the first retry; doubles with each attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Build the policy from the application configuration.
    ///
    /// Fails on a negative, non-finite or overflowing base delay.
    pub fn from_config(completion: &CompletionConfig) -> AppResult<Self> {
        let base_delay = Duration::try_from_secs_f64(completion.retry_base_delay_secs)
            .map_err(|e| {
                AppError::Config(format!(
                    "Invalid retryBaseDelaySecs {}: {}",
                    completion.retry_base_delay_secs, e
                ))
            })?;

        Ok(Self::new(completion.max_retries, base_delay))
    }

    /// Backoff before retry number `attempt` (zero-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Request shape and context limits for a completion client.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    /// Starting context-char-limit for each call
    pub max_context_chars: usize,

    /// The limit is never halved below this floor
    pub min_context_chars: usize,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "groq/compound-mini".to_string(),
            max_tokens: 250,
            temperature: 0.7,
            max_context_chars: 2000,
            min_context_chars: 200,
        }
    }
}

impl CompletionSettings {
    /// Build settings from the application configuration.
    pub fn from_config(completion: &CompletionConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            model: completion.model.clone(),
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
            max_context_chars: retrieval.max_context_chars,
            min_context_chars: retrieval.min_context_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_from_config_defaults() {
        let completion = CompletionConfig::default();
        let retrieval = RetrievalConfig::default();

        let policy = RetryPolicy::from_config(&completion).unwrap();
        assert_eq!(policy, RetryPolicy::default());

        let settings = CompletionSettings::from_config(&completion, &retrieval);
        assert_eq!(settings, CompletionSettings::default());
    }

    #[test]
    fn test_from_config_rejects_unrepresentable_delay() {
        for delay in [f64::INFINITY, f64::NAN, -1.0, f64::MAX] {
            let completion = CompletionConfig {
                retry_base_delay_secs: delay,
                ..Default::default()
            };
            assert!(
                matches!(RetryPolicy::from_config(&completion), Err(AppError::Config(_))),
                "delay {delay} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_config_fractional_delay() {
        let completion = CompletionConfig {
            retry_base_delay_secs: 0.25,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&completion).unwrap();
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
    }
}
