//! Scripted gateways for exercising the pipeline without network access.
//!
//! [`ScriptedLlm`] answers by prompt: each rule pairs a marker (a substring of
//! one built-in prompt, see [`markers`]) with a queue of replies. Replies are
//! consumed in order and the last one repeats.

use crate::gateway::ModelGateway;
use architect_core::{AppError, AppResult, RetryPolicy};
use architect_knowledge::{Passage, Retriever};
use architect_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use architect_prompt::PromptLibrary;
use architect_search::{WebResult, WebSearch};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Substrings identifying each built-in prompt.
pub mod markers {
    pub const EXPAND: &str = "helping improve document retrieval";
    pub const ANSWER: &str = "enterprise AI assistant answering";
    pub const CRITIC: &str = "strict enterprise AI critic";
    pub const REFINE: &str = "enterprise AI refiner";
    pub const VERIFY: &str = "strict AI verifier";
    pub const WEB: &str = "factual AI assistant";
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Transient(String),
    Fail(String),
}

impl Scripted {
    fn into_result(self, model: &str) -> AppResult<LlmResponse> {
        match self {
            Scripted::Reply(content) => Ok(LlmResponse {
                content,
                model: model.to_string(),
                usage: LlmUsage::new(0, 0),
            }),
            Scripted::Transient(msg) => Err(AppError::Network(msg)),
            Scripted::Fail(msg) => Err(AppError::Llm(msg)),
        }
    }
}

/// Language model fake keyed on prompt content.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    rules: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for prompts containing `marker`.
    pub fn on(self, marker: &str, reply: impl Into<String>) -> Self {
        self.push(marker, Scripted::Reply(reply.into()))
    }

    /// Queue a retryable failure for prompts containing `marker`.
    pub fn fail_transient(self, marker: &str, message: impl Into<String>) -> Self {
        self.push(marker, Scripted::Transient(message.into()))
    }

    /// Queue a permanent failure for prompts containing `marker`.
    pub fn fail(self, marker: &str, message: impl Into<String>) -> Self {
        self.push(marker, Scripted::Fail(message.into()))
    }

    fn push(self, marker: &str, scripted: Scripted) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            match rules.iter_mut().find(|(m, _)| m == marker) {
                Some((_, queue)) => queue.push_back(scripted),
                None => rules.push((marker.to_string(), VecDeque::from([scripted]))),
            }
        }
        self
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of prompts received that contain `marker`.
    pub fn count(&self, marker: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(marker))
            .count()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let scripted = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter_mut()
                .find(|(marker, _)| request.prompt.contains(marker.as_str()))
                .and_then(|(_, queue)| {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                })
        };

        match scripted {
            Some(scripted) => scripted.into_result(&request.model),
            None => Err(AppError::Llm(format!(
                "No scripted reply for prompt: {}",
                request.prompt.lines().next().unwrap_or_default()
            ))),
        }
    }
}

/// A [`ModelGateway`] over `llm` with the built-in prompts and no retries.
pub fn test_gateway(llm: Arc<ScriptedLlm>) -> ModelGateway {
    ModelGateway::new(
        llm,
        Arc::new(PromptLibrary::builtin().expect("built-in prompts parse")),
        "scripted-model",
        0.0,
        RetryPolicy::no_retry(Duration::from_secs(5)),
    )
}

/// Retriever returning fixed passages.
#[derive(Debug, Default)]
pub struct StaticRetriever {
    by_query: HashMap<String, Vec<Passage>>,
    fallback: Vec<Passage>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    /// Returns nothing for every query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `passages` for every query without its own entry.
    pub fn with_default(mut self, passages: Vec<Passage>) -> Self {
        self.fallback = passages;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>, passages: Vec<Passage>) -> Self {
        self.by_query.insert(query.into(), passages);
        self
    }

    /// Fails every search with a retrieval error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// `(query, k)` for every search, in order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Passage>> {
        self.calls.lock().unwrap().push((query.to_string(), k));
        if let Some(ref message) = self.failure {
            return Err(AppError::Retrieval(message.clone()));
        }

        let passages = self.by_query.get(query).unwrap_or(&self.fallback);
        Ok(passages.iter().take(k).cloned().collect())
    }
}

/// Web search returning fixed results.
#[derive(Debug, Default)]
pub struct StaticSearch {
    results: Vec<WebResult>,
    failure: Option<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearch {
    pub fn new(results: Vec<WebResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    /// Fails every search with a web search error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// `(query, max_results)` for every search, in order.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WebSearch for StaticSearch {
    fn provider_name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<WebResult>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        if let Some(ref message) = self.failure {
            return Err(AppError::WebSearch(message.clone()));
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}
