//! Serve command handler.

use architect_agent::Pipeline;
use architect_core::{config::AppConfig, AppResult};
use architect_server::AppState;
use clap::Args;
use std::net::SocketAddr;

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default from config: 127.0.0.1:8000)
    #[arg(short, long, env = "ARCHITECT_BIND")]
    pub bind: Option<SocketAddr>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let bind = self.bind.unwrap_or(config.server.bind);
        let pipeline = Pipeline::from_config(config)?;

        tracing::info!(
            web_search = pipeline.has_web_search(),
            "Pipeline ready"
        );

        let state = AppState::new(pipeline, config.server.max_sessions);
        architect_server::serve(state, bind).await
    }
}
