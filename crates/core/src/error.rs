//! Error types for Architect.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, the three external gateways
//! (language model, retriever, web search), prompts and serialization.

use thiserror::Error;

/// Unified error type for Architect.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Gateway output is never trusted to be well formed, so nothing panics on it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model gateway errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Retriever (document index) errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Web search gateway errors
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// Prompt library errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Transient transport failures (connection refused, 429, 5xx)
    #[error("Network error: {0}")]
    Network(String),

    /// A gateway call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout(_))
    }

    /// Whether the error came from one of the external collaborators.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            AppError::Llm(_)
                | AppError::Retrieval(_)
                | AppError::WebSearch(_)
                | AppError::Network(_)
                | AppError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
