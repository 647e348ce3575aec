//! Web search gateway for Architect.
//!
//! Used only on the fallback path, when the document corpus cannot support
//! an answer and the question looks like it needs current external knowledge.

pub mod client;
pub mod factory;
pub mod tavily;

pub use client::{render_web_context, WebResult, WebSearch};
pub use factory::create_search_client;
pub use tavily::TavilyClient;
