//! Command handlers for the ragchat CLI.

pub mod ask;

pub use ask::AskCommand;
