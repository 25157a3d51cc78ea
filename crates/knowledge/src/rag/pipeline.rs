//! Query-to-answer orchestration.

use crate::app::AppContext;
use crate::context::ContextBuilder;
use crate::format::ResponseFormatter;
use crate::rag::types::{Answer, Query};
use ragchat_core::text::head_chars;
use ragchat_core::AppResult;

/// Answers questions from the vector index through the LLM.
///
/// Embedder and index failures propagate as errors. Completion failures are
/// absorbed: the caller receives the degraded apology instead.
pub struct RagPipeline {
    context: AppContext,
    builder: ContextBuilder,
    formatter: ResponseFormatter,
}

impl RagPipeline {
    pub fn new(context: AppContext) -> Self {
        let builder = ContextBuilder::from_config(&context.retrieval);
        Self {
            context,
            builder,
            formatter: ResponseFormatter::new(),
        }
    }

    /// Clamp a caller-supplied top_k into `[1, max_top_k]`.
    pub fn effective_top_k(&self, requested: usize) -> usize {
        let max = self.context.retrieval.max_top_k.max(1);
        let top_k = requested.clamp(1, max);
        if top_k != requested {
            tracing::warn!(requested, used = top_k, "top_k out of range, clamped");
        }
        top_k
    }

    /// Answer one query.
    pub async fn answer(&self, query: &Query) -> AppResult<Answer> {
        if query.text.is_empty() {
            return Ok(Answer::no_query());
        }

        let top_k = self.effective_top_k(query.top_k);
        tracing::info!(top_k, "Running semantic search for query");

        tracing::debug!(
            "Generating embedding for query: {}...",
            head_chars(&query.text, 50)
        );
        let vector = self.context.embedder.embed(&query.text).await?;

        let matches = self.context.index.search(&vector, top_k).await?;
        tracing::info!("Found {} matches", matches.len());

        if matches.is_empty() {
            return Ok(Answer::no_matches());
        }

        let context = self.builder.build(&matches);
        tracing::debug!(context_chars = context.chars().count(), "Built context");

        match self.context.completion.complete(&context, &query.text).await {
            Ok(raw) => Ok(Answer::completed(self.formatter.render(&raw))),
            Err(e) => {
                tracing::error!(exhausted = e.is_exhausted(), "LLM request failed: {}", e);
                Ok(Answer::degraded())
            }
        }
    }
}
