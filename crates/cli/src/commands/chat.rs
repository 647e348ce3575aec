//! Chat command handler: a read-answer loop over stdin.

use architect_agent::{Pipeline, Session};
use architect_core::{config::AppConfig, AppResult};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Interactive conversation on stdin
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = Pipeline::from_config(config)?;
        let mut session = pipeline.new_session();
        tracing::info!(session = %session.id(), "Chat session started");

        eprintln!("Ask a question about the document (type 'exit' to quit).");

        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        run_chat(&pipeline, &mut session, stdin, &mut stdout).await
    }
}

/// What to do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Skip,
    Quit,
    Question(&'a str),
}

fn classify(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        ChatInput::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        ChatInput::Quit
    } else {
        ChatInput::Question(line)
    }
}

/// Answer each input line until end of input or `exit`/`quit`.
///
/// A failed question is reported and the loop continues with the session
/// history unchanged.
async fn run_chat<R, W>(
    pipeline: &Pipeline,
    session: &mut Session,
    input: R,
    output: &mut W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let question = match classify(&line) {
            ChatInput::Skip => continue,
            ChatInput::Quit => break,
            ChatInput::Question(question) => question,
        };

        match pipeline.ask(session, question).await {
            Ok(outcome) => {
                output
                    .write_all(format!("\n{}\n\n", outcome.answer).as_bytes())
                    .await?;
                output.flush().await?;
            }
            Err(e) => {
                tracing::error!("Question failed: {}", e);
                eprintln!("Error: {}", e);
            }
        }
    }

    tracing::info!(turns = session.history().len(), "Chat session ended");
    Ok(())
}
