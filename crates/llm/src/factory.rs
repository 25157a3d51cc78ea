//! Completion client factory.
//!
//! Builds a ready-to-use [`CompletionClient`] from application configuration:
//! resolves the bearer token, creates the HTTP transport with the configured
//! timeout, and derives request settings and the retry policy.

use crate::client::ChatTransport;
use crate::completion::CompletionClient;
use crate::providers::OpenAiCompatTransport;
use crate::types::{CompletionSettings, RetryPolicy};
use ragchat_core::config::{CompletionConfig, RetrievalConfig};
use ragchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create the HTTP transport described by `config`.
///
/// # Errors
/// Returns error if:
/// - The endpoint is empty
/// - The API key was not resolved
/// - The HTTP client cannot be built
pub fn create_transport(config: &CompletionConfig) -> AppResult<Arc<dyn ChatTransport>> {
    if config.endpoint.trim().is_empty() {
        return Err(AppError::Config(
            "Completion endpoint must not be empty".to_string(),
        ));
    }

    let api_key = config.api_key.as_deref().ok_or_else(|| {
        AppError::Config(format!(
            "Completion provider requires API key (set {})",
            config.api_key_env
        ))
    })?;

    let transport = OpenAiCompatTransport::with_timeout(
        &config.endpoint,
        api_key,
        Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Arc::new(transport))
}

/// Create a completion client with transport, settings and retry policy.
pub fn create_client(
    completion: &CompletionConfig,
    retrieval: &RetrievalConfig,
) -> AppResult<CompletionClient> {
    let transport = create_transport(completion)?;

    tracing::debug!(
        endpoint = %completion.endpoint,
        model = %completion.model,
        max_retries = completion.max_retries,
        "Created completion client"
    );

    Ok(CompletionClient::new(
        transport,
        CompletionSettings::from_config(completion, retrieval),
        RetryPolicy::from_config(completion)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_key() {
        let completion = CompletionConfig {
            api_key: Some("gsk-test".to_string()),
            ..Default::default()
        };
        let client = create_client(&completion, &RetrievalConfig::default()).unwrap();
        assert_eq!(client.settings().model, "groq/compound-mini");
        assert_eq!(client.policy().max_retries, 3);
    }

    #[test]
    fn test_requires_api_key() {
        match create_transport(&CompletionConfig::default()) {
            Err(err) => assert!(err.to_string().contains("GROQ_API_KEY")),
            Ok(_) => panic!("Expected error without API key"),
        }
    }

    #[test]
    fn test_infinite_retry_delay_is_an_error() {
        let completion = CompletionConfig {
            api_key: Some("gsk-test".to_string()),
            retry_base_delay_secs: f64::INFINITY,
            ..Default::default()
        };

        match create_client(&completion, &RetrievalConfig::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("retryBaseDelaySecs")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("Expected error for infinite delay"),
        }
    }

    #[test]
    fn test_rejects_empty_endpoint() {
        let completion = CompletionConfig {
            endpoint: "  ".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert!(create_transport(&completion).is_err());
    }
}
