//! Retrieval fan-out and context assembly.

use architect_core::{with_retry, AppResult, RetryPolicy};
use architect_knowledge::{Passage, Retriever};
use std::collections::BTreeSet;

/// Separator between passages in the context blob.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Passages gathered for one question, plus what the prompts and the
/// citation step need from them.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    /// Retrieved passages, in query order then rank order. Duplicates kept.
    pub passages: Vec<Passage>,

    /// Passage texts joined with [`PASSAGE_SEPARATOR`]
    pub text: String,

    /// Distinct locators ("Page 12"), sorted
    pub sources: BTreeSet<String>,
}

impl DocumentContext {
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        let text = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR);
        let sources = passages.iter().filter_map(Passage::locator).collect();

        Self {
            passages,
            text,
            sources,
        }
    }

    /// True when no passage text was retrieved at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Run every query against `retriever`, in order, concatenating the results.
pub async fn retrieve_all(
    retriever: &dyn Retriever,
    queries: &[String],
    k: usize,
    policy: &RetryPolicy,
) -> AppResult<Vec<Passage>> {
    let mut passages = Vec::new();

    for query in queries {
        let query = query.as_str();
        let hits = with_retry(policy, retriever.name(), || retriever.search(query, k)).await?;
        tracing::debug!(query = query, hits = hits.len(), "Retrieved passages");
        passages.extend(hits);
    }

    Ok(passages)
}
