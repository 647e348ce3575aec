//! Final support check.

use crate::context::DocumentContext;
use crate::gateway::ModelGateway;
use crate::signals::SupportVerdict;
use architect_core::AppResult;
use architect_prompt::ids;

/// Ask the verifier whether `answer` is fully supported by `context`.
///
/// An empty context supports nothing, so no model call is made for it.
pub async fn verify(
    model: &ModelGateway,
    answer: &str,
    context: &DocumentContext,
) -> AppResult<SupportVerdict> {
    if context.is_empty() {
        tracing::debug!("Empty context, answer cannot be supported");
        return Ok(SupportVerdict::Unsupported);
    }

    let reply = model
        .run(ids::VERIFY, &[("context", &context.text), ("answer", answer)])
        .await?;
    let verdict = SupportVerdict::parse(&reply);
    tracing::info!(verdict = ?verdict, "Answer verified");
    Ok(verdict)
}
