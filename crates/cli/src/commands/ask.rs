//! Ask command handler.

use architect_agent::Pipeline;
use architect_core::{config::AppConfig, AppError, AppResult};
use clap::Args;
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Output the answer with route, sources and queries as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = self.get_question()?;
        tracing::debug!("Question: {}", question);

        let pipeline = Pipeline::from_config(config)?;
        let mut session = pipeline.new_session();
        let outcome = pipeline.ask(&mut session, &question).await?;

        if self.json {
            let output = serde_json::json!({
                "sessionId": session.id(),
                "answer": outcome.answer,
                "route": outcome.route,
                "sources": outcome.sources,
                "queries": outcome.queries,
                "refineRounds": outcome.refine_rounds,
                "verdict": outcome.verdict,
                "provider": config.provider,
                "model": config.model,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", outcome.answer);
        }

        Ok(())
    }

    fn get_question(&self) -> AppResult<String> {
        let question = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => return Err(AppError::Config("No question provided".to_string())),
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Config("Question is empty".to_string()));
        }
        Ok(question.to_string())
    }
}
