//! Language model gateway for Architect.
//!
//! Every agent in the answering pipeline talks to a model through the
//! [`LlmClient`] trait: submit a prompt, receive generated text.
//!
//! # Providers
//! - **Groq / OpenAI**: OpenAI-compatible chat completions API (default: Groq)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use architect_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatibleClient};
pub use types::ProviderType;
