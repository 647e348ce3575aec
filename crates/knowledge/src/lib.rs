//! Document retrieval for Architect.
//!
//! The answering pipeline only needs one capability from the document side:
//! similarity search returning passages with locator metadata. This crate
//! defines that [`Retriever`] interface and a local [`PassageStore`] backed by
//! a JSON-lines passage file produced by an external ingestion step.

pub mod embeddings;
pub mod retriever;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use embeddings::TrigramEmbedder;
pub use retriever::Retriever;
pub use store::PassageStore;
pub use types::Passage;
