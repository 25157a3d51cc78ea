//! Prompt text sent to the completion service.

/// System message for every grounded answer.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Render the user message from retrieved context and the question.
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the user's question based on the following context:\n{}\n\nQuestion: {}\nAnswer:",
        context, question
    )
}
