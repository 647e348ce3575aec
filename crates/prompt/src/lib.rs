//! Prompt library for Architect.
//!
//! Every language model call in the answering pipeline renders one of the
//! prompts defined here:
//! - YAML prompt definitions (built in, overridable per workspace)
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::render_prompt;
pub use loader::PromptLibrary;
pub use types::PromptDefinition;

/// Ids of the built-in prompts.
pub mod ids {
    /// Query expansion: question -> retrieval queries
    pub const EXPAND: &str = "rag.expand";
    /// Grounded answer generation
    pub const ANSWER: &str = "rag.answer";
    /// Critic review of an answer
    pub const CRITIC: &str = "rag.critic";
    /// Refinement against a critique
    pub const REFINE: &str = "rag.refine";
    /// YES/NO support verification
    pub const VERIFY: &str = "rag.verify";
    /// Answer from web search results
    pub const WEB: &str = "rag.web";
}
