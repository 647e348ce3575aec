//! Self-correcting RAG answering pipeline.
//!
//! [`Pipeline::ask`] is the single entry point. One invocation runs:
//!
//! 1. query expansion ([`expander`])
//! 2. retrieval fan-out and context assembly ([`context`])
//! 3. grounded answer generation with conversation history ([`generator`])
//! 4. the bounded critic/refiner loop ([`refine`])
//! 5. support verification ([`verifier`])
//! 6. fallback routing to a refusal or to web search ([`router`])
//! 7. source citation and the history append
//!
//! Gateway failures propagate to the caller; malformed model output never does.

pub mod context;
pub mod expander;
pub mod gateway;
pub mod generator;
pub mod memory;
pub mod pipeline;
pub mod refine;
pub mod router;
pub mod signals;
pub mod verifier;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::DocumentContext;
pub use gateway::ModelGateway;
pub use generator::UNKNOWN_ANSWER;
pub use memory::{ConversationHistory, ConversationTurn, Session};
pub use pipeline::{AnswerRoute, AskOutcome, Pipeline};
pub use refine::{RefineOutcome, RefineStop};
pub use router::{FallbackRoute, FallbackRouter, TriggerRule};
pub use signals::{CriticVerdict, SupportVerdict};
