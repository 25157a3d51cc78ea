//! Context assembly from search matches.
//!
//! Two independent limits bound the context handed to the LLM:
//! each fragment keeps its first `max_fragment_chars` characters, and the
//! joined context keeps its last `max_context_chars` characters.

use crate::vector_index::Match;
use ragchat_core::config::RetrievalConfig;
use ragchat_core::text::{char_len, head_chars, tail_chars};

/// Separator placed between fragments.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Builds a bounded text context from ordered matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBuilder {
    max_fragment_chars: usize,
    max_context_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(800, 2000)
    }
}

impl ContextBuilder {
    pub fn new(max_fragment_chars: usize, max_context_chars: usize) -> Self {
        Self {
            max_fragment_chars,
            max_context_chars,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.max_fragment_chars, config.max_context_chars)
    }

    /// Fragments in match order, each cut to the per-fragment limit.
    ///
    /// Matches without "text" or "excerpt" metadata contribute nothing.
    pub fn fragments<'a>(&self, matches: &'a [Match]) -> Vec<&'a str> {
        matches
            .iter()
            .filter_map(Match::text)
            .map(|text| head_chars(text, self.max_fragment_chars))
            .collect()
    }

    /// Join the fragments and keep the tail when the result is too long.
    pub fn build(&self, matches: &[Match]) -> String {
        let joined = self.fragments(matches).join(FRAGMENT_SEPARATOR);

        let total = char_len(&joined);
        if total > self.max_context_chars {
            tracing::debug!(
                "Context of {} chars exceeds {}, keeping the tail",
                total,
                self.max_context_chars
            );
            return tail_chars(&joined, self.max_context_chars).to_string();
        }

        joined
    }
}
