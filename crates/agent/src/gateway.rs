//! Language model access for the pipeline stages.
//!
//! Pairs an [`LlmClient`] with the prompt library and the call policy, so a
//! stage only names a prompt and its variables.

use architect_core::{with_retry, AppResult, RetryPolicy};
use architect_llm::{LlmClient, LlmRequest};
use architect_prompt::PromptLibrary;
use std::collections::HashMap;
use std::sync::Arc;

/// Prompt-in, text-out access to the configured model.
#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
    temperature: f32,
    policy: RetryPolicy,
}

impl ModelGateway {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        model: impl Into<String>,
        temperature: f32,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            prompts,
            model: model.into(),
            temperature,
            policy,
        }
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call policy applied to every request.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Render prompt `prompt_id` with `vars`, send it, return the trimmed reply.
    pub async fn run(&self, prompt_id: &str, vars: &[(&str, &str)]) -> AppResult<String> {
        let variables: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let prompt = self.prompts.render(prompt_id, &variables)?;

        self.complete(prompt_id, prompt).await
    }

    async fn complete(&self, label: &str, prompt: String) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_temperature(self.temperature);
        let client = self.client.as_ref();
        let request = &request;

        let response = with_retry(&self.policy, client.provider_name(), || {
            client.complete(request)
        })
        .await?;

        tracing::debug!(
            prompt = label,
            prompt_bytes = request.prompt.len(),
            completion_bytes = response.content.len(),
            total_tokens = response.usage.total_tokens,
            "Model call completed"
        );

        Ok(response.content.trim().to_string())
    }
}
