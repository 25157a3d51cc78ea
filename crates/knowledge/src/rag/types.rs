//! Pipeline input and output types.

use serde::{Deserialize, Serialize};

/// Returned without any downstream call when the question is empty.
pub const NO_QUERY_ANSWER: &str = "No query provided.";

/// Returned when the index has no matches; the LLM is not called.
pub const NO_MATCHES_ANSWER: &str = "Sorry, I couldn't find any relevant information.";

/// Returned when the completion call fails for any reason.
pub const DEGRADED_ANSWER: &str = "Sorry, the language model request failed (rate limit or payload size). Try again with a shorter question.";

/// Default number of matches to retrieve.
pub const DEFAULT_TOP_K: usize = 3;

/// A question to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Question text; may be empty
    pub text: String,

    /// Requested number of matches, clamped by the pipeline
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Empty question
    NoQuery,

    /// The index returned nothing
    NoMatches,

    /// The completion call failed; the text is the apology
    Degraded,

    /// Rendered model answer
    Completed,
}

/// Final answer handed to the caller. Always carries displayable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
}

impl Answer {
    pub fn no_query() -> Self {
        Self {
            text: NO_QUERY_ANSWER.to_string(),
            kind: AnswerKind::NoQuery,
        }
    }

    pub fn no_matches() -> Self {
        Self {
            text: NO_MATCHES_ANSWER.to_string(),
            kind: AnswerKind::NoMatches,
        }
    }

    pub fn degraded() -> Self {
        Self {
            text: DEGRADED_ANSWER.to_string(),
            kind: AnswerKind::Degraded,
        }
    }

    pub fn completed(html: String) -> Self {
        Self {
            text: html,
            kind: AnswerKind::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let query = Query::new("What are the hostel fees?");
        assert_eq!(query.top_k, 3);
        assert_eq!(query.with_top_k(7).top_k, 7);
    }

    #[test]
    fn test_query_deserialize_default_top_k() {
        let query: Query = serde_json::from_str(r#"{"text": "fees"}"#).unwrap();
        assert_eq!(query.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_sentinel_answers() {
        assert_eq!(Answer::no_query().text, "No query provided.");
        assert_eq!(
            Answer::no_matches().text,
            "Sorry, I couldn't find any relevant information."
        );
        assert_eq!(Answer::degraded().kind, AnswerKind::Degraded);
    }

    #[test]
    fn test_answer_serialization() {
        let json = serde_json::to_value(Answer::no_matches()).unwrap();
        assert_eq!(json["kind"], "no_matches");
    }
}
