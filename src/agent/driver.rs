//! Bounded tool-calling loop.
//!
//! One user turn alternates model calls and sequential tool dispatch until the
//! model answers without requesting tools, or the round limit is hit.

use std::time::Duration;

use tracing::{debug, warn};

use super::transcript::Transcript;
use crate::client::{AssistantTurn, ChatModel};
use crate::drivers::CompletionRequest;
use crate::mcp::ToolRegistry;
use crate::types::tool::{ToolDefinition, ToolRequest};
use crate::{Error, Result};

/// Model calls allowed per user turn unless configured otherwise.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Result of a single model call and the dispatch it triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The model answered without requesting tools.
    Answer(String),
    /// This many tool requests were dispatched and answered in the transcript.
    ToolsDispatched(usize),
}

/// How a user turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Final answer, trimmed of surrounding whitespace.
    Answer(String),
    /// The model was still requesting tools after `rounds` calls.
    RoundLimitReached { rounds: usize },
}

pub struct ConversationDriver {
    model: Box<dyn ChatModel>,
    registry: ToolRegistry,
    definitions: Vec<ToolDefinition>,
    max_rounds: usize,
    model_timeout: Option<Duration>,
}

impl ConversationDriver {
    /// Build a driver over an already discovered registry.
    pub fn new(model: Box<dyn ChatModel>, registry: ToolRegistry) -> Self {
        let definitions = registry.definitions();
        Self {
            model,
            registry,
            definitions,
            max_rounds: DEFAULT_MAX_ROUNDS,
            model_timeout: None,
        }
    }

    /// Cap model calls per user turn (at least one).
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Bound every model call; `None` waits indefinitely.
    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Append the user's utterance and run rounds until an answer or the limit.
    ///
    /// Model failures end the turn with an error; tool failures never do.
    pub async fn run_turn(&self, transcript: &mut Transcript, user_text: &str) -> Result<TurnOutcome> {
        transcript.push_user(user_text)?;

        for round in 1..=self.max_rounds {
            debug!(round, max_rounds = self.max_rounds, "model round");
            if let RoundOutcome::Answer(text) = self.run_round(transcript).await? {
                return Ok(TurnOutcome::Answer(text));
            }
        }

        warn!(
            rounds = self.max_rounds,
            "round limit reached while the model was still requesting tools"
        );
        Ok(TurnOutcome::RoundLimitReached {
            rounds: self.max_rounds,
        })
    }

    /// One model call, plus dispatch of every tool it requested.
    pub async fn run_round(&self, transcript: &mut Transcript) -> Result<RoundOutcome> {
        let reply = self.call_model(transcript).await?;

        if !reply.has_tool_requests() {
            let answer = reply.text.trim().to_string();
            transcript.push_assistant(reply.text, Vec::new())?;
            return Ok(RoundOutcome::Answer(answer));
        }

        let requests = reply.tool_requests.clone();
        transcript.push_assistant(reply.text, reply.tool_requests)?;

        for request in &requests {
            let result_text = self.dispatch(request).await;
            transcript.push_tool_result(&request.id, &request.tool_name, result_text)?;
        }
        Ok(RoundOutcome::ToolsDispatched(requests.len()))
    }

    /// Release the tool peer.
    pub async fn shutdown(&self) -> Result<()> {
        self.registry.shutdown().await
    }

    async fn call_model(&self, transcript: &Transcript) -> Result<AssistantTurn> {
        let request = CompletionRequest::new(self.model.model_id(), transcript.messages(), &self.definitions);
        let call = self.model.complete(&request);
        match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| Error::Timeout {
                operation: format!("model '{}'", self.model.model_id()),
                elapsed_ms: limit.as_millis() as u64,
            })?,
            None => call.await,
        }
    }

    /// Invoke one tool; failures become the result text.
    async fn dispatch(&self, request: &ToolRequest) -> String {
        debug!(tool = %request.tool_name, id = %request.id, "dispatching tool request");
        match self
            .registry
            .invoke(&request.tool_name, request.arguments.to_mapping())
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = %request.tool_name, error = %e, "tool invocation failed");
                format!("Error: {}", e)
            }
        }
    }
}
