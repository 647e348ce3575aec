//! LLM provider factory.
//!
//! Builds the concrete [`LlmClient`] for a provider name, resolving the
//! default endpoint and checking that a key is present when one is needed.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatibleClient};
use crate::types::ProviderType;
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by "groq" and "openai")
///
/// # Errors
/// Returns an error message if the provider is unknown or its key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_base_url(base_url))),
        ProviderType::Groq | ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                format!("{} provider requires API key", provider_type.as_str())
            })?;
            Ok(Arc::new(OpenAiCompatibleClient::new(
                provider_type.as_str(),
                base_url,
                api_key,
            )))
        }
    }
}
