//! Bounded critic/refiner loop.

use crate::gateway::ModelGateway;
use crate::signals::CriticVerdict;
use architect_core::AppResult;
use architect_prompt::ids;
use serde::Serialize;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineStop {
    /// The critic approved the current answer.
    Approved,
    /// The refiner returned the answer unchanged.
    Converged,
    /// The round cap was reached.
    RoundLimit,
}

/// Result of [`self_correct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineOutcome {
    pub answer: String,
    /// Refiner calls made
    pub rounds: usize,
    pub stop: RefineStop,
}

/// Ask the critic to review `answer` against `context`.
pub async fn critique(model: &ModelGateway, answer: &str, context: &str) -> AppResult<CriticVerdict> {
    let reply = model
        .run(ids::CRITIC, &[("context", context), ("answer", answer)])
        .await?;
    Ok(CriticVerdict::parse(&reply))
}

/// Rewrite `answer` to address `critique`, using only `context`.
pub async fn refine(
    model: &ModelGateway,
    answer: &str,
    critique: &str,
    context: &str,
) -> AppResult<String> {
    model
        .run(
            ids::REFINE,
            &[("context", context), ("answer", answer), ("critique", critique)],
        )
        .await
}

/// Alternate critic and refiner for at most `max_rounds` rounds.
pub async fn self_correct(
    model: &ModelGateway,
    answer: String,
    context: &str,
    max_rounds: usize,
) -> AppResult<RefineOutcome> {
    let mut current = answer;

    for round in 0..max_rounds {
        let feedback = match critique(model, &current, context).await? {
            CriticVerdict::Approved => {
                tracing::info!(round, "Critic approved answer");
                return Ok(RefineOutcome {
                    answer: current,
                    rounds: round,
                    stop: RefineStop::Approved,
                });
            }
            CriticVerdict::Revise(feedback) => {
                tracing::info!(round, critique_bytes = feedback.len(), "Critic requested revision");
                feedback
            }
        };

        let refined = refine(model, &current, &feedback, context).await?;
        if refined == current {
            tracing::info!(round, "Refiner returned the answer unchanged");
            return Ok(RefineOutcome {
                answer: current,
                rounds: round + 1,
                stop: RefineStop::Converged,
            });
        }
        current = refined;
    }

    Ok(RefineOutcome {
        answer: current,
        rounds: max_rounds,
        stop: RefineStop::RoundLimit,
    })
}
