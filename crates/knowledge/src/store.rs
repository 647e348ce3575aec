//! Local passage store.
//!
//! Reads a JSON-lines file where each line is a [`Passage`]
//! (`{"text": "...", "metadata": {"page": 12}}`), embeds every passage once
//! at load time and answers similarity queries by cosine ranking.

use crate::embeddings::{cosine, TrigramEmbedder};
use crate::retriever::Retriever;
use crate::types::Passage;
use architect_core::{AppError, AppResult};
use std::path::Path;

/// In-memory similarity index over a fixed passage set.
#[derive(Debug, Clone)]
pub struct PassageStore {
    embedder: TrigramEmbedder,
    entries: Vec<(Passage, Vec<f32>)>,
}

impl PassageStore {
    /// Build a store from passages already in memory.
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        let embedder = TrigramEmbedder::default();
        let entries = passages
            .into_iter()
            .map(|p| {
                let embedding = embedder.embed(&p.text);
                (p, embedding)
            })
            .collect();

        Self { embedder, entries }
    }

    /// Load passages from a JSON-lines file. Blank lines are skipped.
    pub fn open(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Retrieval(format!(
                "Passage index not found at {:?}. Run the ingestion step first.",
                path
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Retrieval(format!("Failed to read passage index {:?}: {}", path, e))
        })?;

        let mut passages = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let passage: Passage = serde_json::from_str(line).map_err(|e| {
                AppError::Retrieval(format!(
                    "Invalid passage on line {} of {:?}: {}",
                    line_no + 1,
                    path,
                    e
                ))
            })?;
            passages.push(passage);
        }

        tracing::info!("Loaded {} passages from {:?}", passages.len(), path);
        Ok(Self::from_passages(passages))
    }

    /// Number of passages in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no passages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-`k` passages with their similarity scores, best first.
    ///
    /// Passages with equal scores keep their file order.
    pub fn search_scored(&self, query: &str, k: usize) -> Vec<(&Passage, f32)> {
        if k == 0 {
            return Vec::new();
        }

        let query_embedding = self.embedder.embed(query);
        let mut scored: Vec<(&Passage, f32)> = self
            .entries
            .iter()
            .map(|(passage, embedding)| (passage, cosine(&query_embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

#[async_trait::async_trait]
impl Retriever for PassageStore {
    fn name(&self) -> &str {
        "passage-store"
    }

    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Passage>> {
        let results = self.search_scored(query, k);

        tracing::debug!(
            query = query,
            hits = results.len(),
            top_score = results.first().map(|(_, s)| *s).unwrap_or(0.0),
            "Passage store search"
        );

        Ok(results.into_iter().map(|(p, _)| p.clone()).collect())
    }
}
