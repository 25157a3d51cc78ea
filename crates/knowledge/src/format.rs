//! Answer rendering.
//!
//! Model output is Markdown; callers receive HTML. Tables and fenced code
//! blocks are enabled, everything else follows CommonMark. Rendering never
//! fails: malformed Markdown is rendered best-effort.

use pulldown_cmark::{html, Options, Parser};

/// Renders raw model answers into HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render Markdown to HTML. The trailing newline is dropped.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);

        let trimmed_len = output.trim_end_matches('\n').len();
        output.truncate(trimmed_len);
        output
    }
}
