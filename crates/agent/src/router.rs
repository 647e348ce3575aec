//! Fallback routing for answers the document cannot support.
//!
//! Routing is a rule table: each [`TriggerRule`] maps a case-insensitive
//! substring of the question to a route. The first matching rule wins and a
//! question matching no rule gets the refusal.

use crate::gateway::ModelGateway;
use architect_core::{with_retry, AppResult, RetryPolicy};
use architect_prompt::ids;
use architect_search::{render_web_context, WebSearch};

/// Prefix of every web-derived answer.
pub const WEB_FALLBACK_NOTICE: &str = "⚠️ Not found in the document.\n🌐 Web-based answer:\n";

/// Where an unsupported answer goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackRoute {
    /// Answer with the unknown sentinel.
    Refuse,
    /// Answer from web search results.
    WebSearch,
}

/// One routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRule {
    pattern: String,
    route: FallbackRoute,
}

impl TriggerRule {
    pub fn new(pattern: impl AsRef<str>, route: FallbackRoute) -> Self {
        Self {
            pattern: pattern.as_ref().to_lowercase(),
            route,
        }
    }

    /// Lowercased substring this rule looks for.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn route(&self) -> FallbackRoute {
        self.route
    }

    fn matches(&self, question_lower: &str) -> bool {
        !self.pattern.is_empty() && question_lower.contains(&self.pattern)
    }
}

/// Ordered trigger rules.
#[derive(Debug, Clone, Default)]
pub struct FallbackRouter {
    rules: Vec<TriggerRule>,
}

impl FallbackRouter {
    /// One web-search rule per trigger, in the given order.
    pub fn from_triggers<I, S>(triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: triggers
                .into_iter()
                .map(|t| TriggerRule::new(t, FallbackRoute::WebSearch))
                .collect(),
        }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: TriggerRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    /// First rule matching `question`, if any.
    pub fn matching_rule(&self, question: &str) -> Option<&TriggerRule> {
        let lower = question.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lower))
    }

    pub fn route(&self, question: &str) -> FallbackRoute {
        self.matching_rule(question)
            .map(TriggerRule::route)
            .unwrap_or(FallbackRoute::Refuse)
    }
}

/// Search the web for `question` and answer from the results.
///
/// Returns the model's answer without the notice; see [`label_web_answer`].
pub async fn web_answer(
    model: &ModelGateway,
    search: &dyn WebSearch,
    question: &str,
    max_results: usize,
    policy: &RetryPolicy,
) -> AppResult<String> {
    let results = with_retry(policy, search.provider_name(), || {
        search.search(question, max_results)
    })
    .await?;
    tracing::info!(results = results.len(), "Web search completed");

    let web_context = render_web_context(&results);
    model
        .run(ids::WEB, &[("web_context", &web_context), ("question", question)])
        .await
}

/// Prefix a web-derived answer with the not-in-document notice.
pub fn label_web_answer(answer: &str) -> String {
    format!("{}{}", WEB_FALLBACK_NOTICE, answer)
}
