//! Request handlers.

use crate::error::{Result, ServerError};
use crate::state::AppState;
use architect_agent::AnswerRoute;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,

    /// Continue this session; omitted or unknown starts a new one
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,

    /// Session to pass back for follow-up questions
    pub session_id: String,

    pub route: AnswerRoute,

    /// Locators cited in the answer
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /ask
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    if request.question.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "question must not be empty".to_string(),
        ));
    }

    let handle = state.session(request.session_id.as_deref()).await;
    let mut session = handle.lock().await;

    let outcome = state.pipeline().ask(&mut session, &request.question).await?;

    Ok(Json(AskResponse {
        answer: outcome.answer,
        session_id: session.id().to_string(),
        route: outcome.route,
        sources: outcome.sources,
    }))
}

/// DELETE /sessions/{id}
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.remove_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound(format!("session {}", id)))
    }
}
