//! LLM client abstraction and request/response types.

use architect_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text to send to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama-3.3-70b-versatile")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Trait for LLM providers.
///
/// This trait abstracts the underlying provider (Groq, OpenAI, Ollama)
/// behind one prompt-in, text-out call.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "groq").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

/// Map a transport error onto the error taxonomy.
///
/// Connection failures and client-side timeouts are transient; everything
/// else (bad URL, body encoding) is reported as an LLM error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        AppError::Network(format!("{} unreachable: {}", provider, err))
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// Rate limiting and server errors are transient.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> AppError {
    let message = format!("{} API error ({}): {}", provider, status, body);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::Network(message)
    } else {
        AppError::Llm(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Hi", "llama3")
            .with_temperature(0.0)
            .with_max_tokens(64)
            .with_system("be brief");

        assert_eq!(request.prompt, "Hi");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_usage_total() {
        let usage = LlmUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);

        let huge = LlmUsage::new(u32::MAX, 10);
        assert_eq!(huge.total_tokens, u32::MAX);
    }

    #[test]
    fn test_status_error_classification() {
        let rate_limited = status_error("groq", reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(rate_limited.is_transient());

        let unavailable = status_error("groq", reqwest::StatusCode::BAD_GATEWAY, "");
        assert!(unavailable.is_transient());

        let unauthorized = status_error("groq", reqwest::StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(unauthorized, AppError::Llm(_)));
        assert!(unauthorized.to_string().contains("401"));
    }
}
