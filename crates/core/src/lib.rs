//! Architect Core Library
//!
//! This crate provides the foundational utilities shared by every Architect crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Gateway call policy (timeouts and retries)

pub mod config;
pub mod error;
pub mod logging;
pub mod retry;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use retry::{with_retry, RetryPolicy};
