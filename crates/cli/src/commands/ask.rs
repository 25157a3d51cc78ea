//! Ask command handler.
//!
//! Runs one question through the retrieval pipeline and prints the answer.

use clap::Args;
use ragchat_core::{config::AppConfig, AppResult};
use ragchat_knowledge::{Answer, AppContext, Query, RagPipeline};

/// Ask a question against the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of matches to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let context = AppContext::initialize(config).await?;
        let pipeline = RagPipeline::new(context);

        let query = match self.top_k {
            Some(top_k) => Query::new(&self.question).with_top_k(top_k),
            None => Query::new(&self.question).with_top_k(config.retrieval.default_top_k),
        };

        let answer = pipeline.answer(&query).await?;
        println!("{}", self.render(&answer)?);

        Ok(())
    }

    fn render(&self, answer: &Answer) -> AppResult<String> {
        if self.json {
            let output = serde_json::json!({
                "answer": answer.text,
                "kind": answer.kind,
            });
            Ok(serde_json::to_string_pretty(&output)?)
        } else {
            Ok(answer.text.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(json: bool) -> AskCommand {
        AskCommand {
            question: "q".to_string(),
            top_k: None,
            json,
        }
    }

    #[test]
    fn test_render_plain() {
        let rendered = command(false).render(&Answer::no_matches()).unwrap();
        assert_eq!(rendered, Answer::no_matches().text);
    }

    #[test]
    fn test_render_json() {
        let answer = Answer::completed("<p>42</p>".to_string());
        let rendered = command(true).render(&answer).unwrap();

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["answer"], "<p>42</p>");
        assert_eq!(value["kind"], "completed");
    }
}
