//! Completion transport implementations.

pub mod openai;

pub use openai::OpenAiCompatTransport;
