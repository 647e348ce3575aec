//! Retriever abstraction.

use crate::types::Passage;
use architect_core::AppResult;

/// Similarity search over the document corpus.
///
/// Implementations return at most `k` passages, best match first. An empty
/// result is not an error.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Return the top-`k` passages for `query`.
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Passage>>;
}
