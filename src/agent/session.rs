//! Interactive line-based session over any async reader and writer.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use super::driver::{ConversationDriver, TurnOutcome};
use super::prompt::{is_quit_command, PROMPT, QUIT_HINT, USAGE_HINT};
use super::transcript::Transcript;
use crate::Result;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
}

/// One connected conversation: the driver and the transcript it owns.
pub struct Session {
    driver: ConversationDriver,
    transcript: Transcript,
}

impl Session {
    pub fn new(driver: ConversationDriver, system_prompt: impl Into<String>) -> Self {
        Self {
            driver,
            transcript: Transcript::new(system_prompt),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run the prompt loop until `quit`/`exit` or end of input.
    ///
    /// The tool peer is shut down on every exit path, including I/O errors.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let outcome = self.prompt_loop(input, output).await;
        if let Err(e) = self.driver.shutdown().await {
            warn!(error = %e, "tool peer shutdown failed");
        }
        outcome
    }

    async fn prompt_loop<R, W>(&mut self, input: R, output: &mut W) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let banner = format!(
            "Connected. Tools: {:?}\n{}\n{}\n",
            self.driver.registry().tool_names(),
            USAGE_HINT,
            QUIT_HINT
        );
        output.write_all(banner.as_bytes()).await?;

        let mut lines = input.lines();
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                info!("end of input, closing session");
                output.write_all(b"\n").await?;
                output.flush().await?;
                return Ok(SessionEnd::EndOfInput);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_quit_command(line) {
                info!("user quit");
                return Ok(SessionEnd::Quit);
            }

            let reply = match self.driver.run_turn(&mut self.transcript, line).await {
                Ok(TurnOutcome::Answer(text)) => format!("\n{}\n\n", text),
                Ok(TurnOutcome::RoundLimitReached { rounds }) => format!(
                    "\n[No final answer after {} model calls; the request was stopped. Try rephrasing it.]\n\n",
                    rounds
                ),
                Err(e) => {
                    warn!(error = %e, "turn failed");
                    format!("\nError: {}\n\n", e)
                }
            };
            output.write_all(reply.as_bytes()).await?;
            output.flush().await?;
        }
    }
}
