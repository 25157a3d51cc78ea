//! Pinecone vector index client.
//!
//! Talks to the Pinecone REST API:
//! - control plane `GET /indexes/{name}` to verify the index and find its host
//! - data plane `POST {host}/query` for nearest-neighbour search
//!
//! The client is built once at start-up and is read-only afterwards.

use crate::vector_index::{normalize_matches, Match, VectorIndexClient};
use ragchat_core::config::IndexConfig;
use ragchat_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

const API_VERSION: &str = "2024-07";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Index description returned by the control plane (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub host: String,
    #[serde(default)]
    pub metric: Option<String>,
}

/// Query request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

/// Pinecone data-plane client bound to one index.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    /// Data-plane base URL, with scheme and without trailing slash
    host: String,
    namespace: Option<String>,
}

/// Prefix `https://` when the host has no scheme and drop any trailing slash.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn http_client() -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::VectorIndex(format!("Failed to create HTTP client: {}", e)))
}

impl PineconeIndex {
    /// Create a client for a known data-plane host without contacting Pinecone.
    pub fn with_host(
        host: &str,
        api_key: impl Into<String>,
        namespace: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            host: normalize_host(host),
            namespace,
        })
    }

    /// Connect to the configured index.
    ///
    /// When an index name is configured, the index is described first: a
    /// missing index or a dimension different from `expected_dimensions` is a
    /// start-up error. A configured host takes precedence over the described one.
    pub async fn connect(config: &IndexConfig, expected_dimensions: usize) -> AppResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AppError::Config(format!(
                "Pinecone requires an API key (set {})",
                config.api_key_env
            ))
        })?;

        let host = if config.index_name.trim().is_empty() {
            config.host.clone().ok_or_else(|| {
                AppError::Config("Either an index name or a host must be configured".to_string())
            })?
        } else {
            let description =
                describe_index(&config.control_plane_url, &api_key, &config.index_name).await?;

            if description.dimension != expected_dimensions {
                return Err(AppError::VectorIndex(format!(
                    "Index '{}' has dimension {}, but the embedder produces {}",
                    description.name, description.dimension, expected_dimensions
                )));
            }

            info!(
                index = %description.name,
                dimension = description.dimension,
                metric = description.metric.as_deref().unwrap_or("unknown"),
                "Pinecone index verified"
            );

            config.host.clone().unwrap_or(description.host)
        };

        Self::with_host(&host, api_key, config.namespace.clone())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Run a query and return the untouched JSON response.
    #[instrument(skip(self, vector), fields(dimension = vector.len()))]
    pub async fn query_raw(&self, vector: &[f32], top_k: usize) -> AppResult<Value> {
        let url = format!("{}/query", self.host);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Failed to query Pinecone: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorIndex(format!(
                "Pinecone query failed ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Failed to parse Pinecone response: {}", e)))
    }
}

#[async_trait::async_trait]
impl VectorIndexClient for PineconeIndex {
    fn provider_name(&self) -> &str {
        "pinecone"
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<Match>> {
        let raw = self.query_raw(vector, top_k).await?;
        let matches = normalize_matches(&raw);
        debug!("Pinecone returned {} matches", matches.len());
        Ok(matches)
    }
}

/// Describe an index through the control plane.
pub async fn describe_index(
    control_plane_url: &str,
    api_key: &str,
    index_name: &str,
) -> AppResult<IndexDescription> {
    let url = format!(
        "{}/indexes/{}",
        control_plane_url.trim_end_matches('/'),
        index_name
    );

    let response = http_client()?
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| AppError::VectorIndex(format!("Failed to reach Pinecone: {}", e)))?;

    match response.status() {
        StatusCode::NOT_FOUND => Err(AppError::VectorIndex(format!(
            "Index '{}' does not exist",
            index_name
        ))),
        status if !status.is_success() => {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::VectorIndex(format!(
                "Failed to describe index '{}' ({}): {}",
                index_name, status, body
            )))
        }
        _ => response.json().await.map_err(|e| {
            AppError::VectorIndex(format!("Failed to parse index description: {}", e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("docs-abc123.svc.aped-4627-b74a.pinecone.io"),
            "https://docs-abc123.svc.aped-4627-b74a.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1f32, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }
}
