//! ragchat core library
//!
//! This crate provides the foundational utilities shared by the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Character-safe text truncation

pub mod config;
pub mod error;
pub mod logging;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
