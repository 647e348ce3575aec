//! Query expansion: one question in, a few retrieval queries out.

use crate::gateway::ModelGateway;
use architect_core::AppResult;
use architect_prompt::ids;

/// Ask the model for up to `max_queries` reformulations of `question`.
///
/// Falls back to the trimmed question itself when the reply has no usable
/// lines, so retrieval always gets at least one query.
pub async fn expand_queries(
    model: &ModelGateway,
    question: &str,
    max_queries: usize,
) -> AppResult<Vec<String>> {
    let count = max_queries.to_string();
    let reply = model
        .run(ids::EXPAND, &[("question", question), ("count", &count)])
        .await?;

    let queries = parse_queries(&reply, max_queries);
    if queries.is_empty() {
        tracing::warn!("Query expansion returned no usable lines, using the question");
        return Ok(vec![question.trim().to_string()]);
    }

    tracing::info!(count = queries.len(), "Expanded question into queries");
    Ok(queries)
}

/// Split a model reply into at most `max` queries.
///
/// One query per non-blank line, in reply order. List markers the model adds
/// despite the instructions (`1.`, `2)`, `-`, `*`) are removed.
pub fn parse_queries(reply: &str, max: usize) -> Vec<String> {
    reply
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix(['.', ')']) {
            return stripped.trim();
        }
    }
    line
}
