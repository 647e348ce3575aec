//! Grounded answer generation.

use crate::context::DocumentContext;
use crate::gateway::ModelGateway;
use crate::memory::ConversationHistory;
use architect_core::AppResult;
use architect_prompt::ids;

/// The refusal used whenever the document cannot answer.
pub const UNKNOWN_ANSWER: &str = "I don't know based on the document.";

/// Draft an answer from the context and the conversation so far.
pub async fn generate_answer(
    model: &ModelGateway,
    context: &DocumentContext,
    history: &ConversationHistory,
    question: &str,
) -> AppResult<String> {
    let history = history.render();
    model
        .run(
            ids::ANSWER,
            &[
                ("history", &history),
                ("context", &context.text),
                ("question", question),
                ("unknown", UNKNOWN_ANSWER),
            ],
        )
        .await
}

/// Whether `answer` is a refusal ("I don't know ..."), ignoring case.
pub fn is_unknown(answer: &str) -> bool {
    answer
        .trim_start()
        .to_lowercase()
        .replace('\u{2019}', "'")
        .starts_with("i don't know")
}
