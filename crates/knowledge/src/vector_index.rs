//! Vector index abstraction.
//!
//! Defines the canonical [`Match`] and the [`VectorIndexClient`] trait the
//! pipeline queries. Raw upstream payloads are turned into matches by
//! [`normalize_matches`]; nothing else in the crate looks at upstream shapes.

use ragchat_core::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,

    #[serde(default)]
    pub score: f32,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Match {
    pub fn new(id: impl Into<String>, score: f32, metadata: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }

    /// Text carried by the match: metadata "text", else "excerpt".
    ///
    /// Missing, non-string and empty values are treated alike.
    pub fn text(&self) -> Option<&str> {
        ["text", "excerpt"].iter().find_map(|key| {
            self.metadata
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
    }
}

/// Trait for vector index backends.
///
/// Implementations return matches in the order the service ranked them
/// (similarity descending) and never retry; an error is fatal for the query.
#[async_trait::async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Backend name (e.g., "pinecone")
    fn provider_name(&self) -> &str;

    /// Return up to `top_k` nearest matches with metadata.
    async fn search(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<Match>>;
}

/// Raw match as the upstream service sends it. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl From<RawMatch> for Match {
    fn from(raw: RawMatch) -> Self {
        let id = match raw.id {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Match {
            id,
            score: raw.score.unwrap_or(0.0),
            metadata: raw.metadata.unwrap_or_default(),
        }
    }
}

/// Convert a raw query response into the canonical match list.
///
/// Accepted shapes:
/// - `{"matches": [...]}` (current query API)
/// - `{"results": [{"matches": [...]}, ...]}` (legacy multi-query envelope;
///   matches of every result are concatenated in order)
///
/// Anything else yields an empty list. Entries that are not objects are skipped.
pub fn normalize_matches(response: &Value) -> Vec<Match> {
    let arrays: Vec<&Vec<Value>> = if let Some(matches) = response.get("matches") {
        matches.as_array().into_iter().collect()
    } else if let Some(results) = response.get("results").and_then(Value::as_array) {
        results
            .iter()
            .filter_map(|r| r.get("matches").and_then(Value::as_array))
            .collect()
    } else {
        Vec::new()
    };

    arrays
        .into_iter()
        .flatten()
        .filter_map(|m| match serde_json::from_value::<RawMatch>(m.clone()) {
            Ok(raw) => Some(Match::from(raw)),
            Err(e) => {
                tracing::debug!("Skipping malformed match entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_matches_key() {
        let response = json!({
            "matches": [
                {"id": "a", "score": 0.9, "metadata": {"text": "Alpha", "url": "https://x/a"}},
                {"id": "b", "score": 0.7, "values": [], "metadata": {"excerpt": "Beta"}}
            ],
            "namespace": "",
            "usage": {"readUnits": 5}
        });

        let matches = normalize_matches(&response);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].score, 0.9);
        assert_eq!(matches[0].text(), Some("Alpha"));
        assert_eq!(matches[1].text(), Some("Beta"));
    }

    #[test]
    fn test_normalize_legacy_results_envelope() {
        let response = json!({
            "results": [
                {"matches": [{"id": "1", "score": 0.5, "metadata": {"text": "one"}}]},
                {"matches": [{"id": "2", "score": 0.4}]}
            ]
        });

        let matches = normalize_matches(&response);
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(matches[1].metadata.is_empty());
    }

    #[test]
    fn test_normalize_preserves_upstream_order() {
        let response = json!({
            "matches": [
                {"id": "low", "score": 0.1},
                {"id": "high", "score": 0.9}
            ]
        });

        let ids: Vec<String> = normalize_matches(&response).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["low", "high"]);
    }

    #[test]
    fn test_normalize_unknown_shapes_are_empty() {
        assert!(normalize_matches(&json!({})).is_empty());
        assert!(normalize_matches(&json!({"matches": null})).is_empty());
        assert!(normalize_matches(&json!({"data": [{"id": "x"}]})).is_empty());
        assert!(normalize_matches(&json!([1, 2, 3])).is_empty());
        assert!(normalize_matches(&Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_skips_non_object_entries() {
        let response = json!({"matches": ["junk", {"id": 7, "score": 0.3}]});
        let matches = normalize_matches(&response);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "7");
    }

    #[test]
    fn test_text_fallbacks() {
        let mut metadata = Map::new();
        metadata.insert("text".to_string(), json!(""));
        metadata.insert("excerpt".to_string(), json!("fallback"));
        assert_eq!(Match::new("m", 0.0, metadata).text(), Some("fallback"));

        let mut metadata = Map::new();
        metadata.insert("text".to_string(), json!(42));
        assert_eq!(Match::new("m", 0.0, metadata).text(), None);

        assert_eq!(Match::new("m", 0.0, Map::new()).text(), None);
    }
}
