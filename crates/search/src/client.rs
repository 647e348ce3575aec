//! Web search abstraction and result type.

use architect_core::AppResult;
use serde::{Deserialize, Serialize};

/// A single ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,

    /// Snippet or extracted page content
    pub content: String,

    #[serde(default)]
    pub url: Option<String>,
}

impl WebResult {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: None,
        }
    }
}

/// Trait for web search providers.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Provider name (e.g. "tavily").
    fn provider_name(&self) -> &str;

    /// Return up to `max_results` results for `query`, best first.
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<WebResult>>;
}

/// Flatten results into the blob handed to the web-answer prompt.
///
/// One `- <title>: <content>` line per result, in rank order.
pub fn render_web_context(results: &[WebResult]) -> String {
    results
        .iter()
        .map(|r| format!("- {}: {}\n", r.title, r.content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_web_context() {
        let results = vec![
            WebResult::new("NVIDIA leadership", "Jensen Huang is CEO."),
            WebResult::new("Company profile", "Founded in 1993."),
        ];

        assert_eq!(
            render_web_context(&results),
            "- NVIDIA leadership: Jensen Huang is CEO.\n- Company profile: Founded in 1993.\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_web_context(&[]), "");
    }
}
