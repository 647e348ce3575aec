//! HTTP surface for the answering pipeline.
//!
//! - `POST /ask` answers a question within a session
//! - `DELETE /sessions/{id}` forgets a session
//! - `GET /health` liveness probe

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ErrorResponse, ServerError};
pub use routes::{AskRequest, AskResponse, HealthResponse};
pub use state::AppState;

use architect_core::{AppError, AppResult};
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/ask", post(routes::ask_handler))
        .route("/sessions/{id}", delete(routes::delete_session_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn serve(state: AppState, bind: SocketAddr) -> AppResult<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", bind, e)))?;

    tracing::info!("Listening on {}", bind);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Other(format!("Server error: {}", e)))
}
