//! Append-only conversation transcript.

use crate::types::message::Message;
use crate::types::tool::ToolRequest;
use crate::{Error, ErrorContext, Result};

/// Ordered conversation history of one session.
///
/// Every tool message answers a request of the most recent assistant
/// message, exactly once. Appends that would break this are rejected, and no
/// user or assistant message may follow while requests are unanswered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Ids of the latest assistant message's requests that have no result yet.
    unanswered: Vec<String>,
}

impl Transcript {
    /// A transcript seeded with one system message.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            unanswered: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool request ids still waiting for a result.
    pub fn unanswered(&self) -> &[String] {
        &self.unanswered
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_settled("user message")?;
        self.messages.push(Message::user(text));
        Ok(())
    }

    /// Append an assistant message verbatim, keeping the model's correlation ids.
    pub fn push_assistant(&mut self, text: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Result<()> {
        self.ensure_settled("assistant message")?;
        self.unanswered = tool_requests.iter().map(|r| r.id.clone()).collect();
        self.messages
            .push(Message::assistant_with_tools(text, tool_requests));
        Ok(())
    }

    pub fn push_tool_result(
        &mut self,
        tool_request_id: &str,
        tool_name: &str,
        result_text: impl Into<String>,
    ) -> Result<()> {
        let Some(pos) = self.unanswered.iter().position(|id| id == tool_request_id) else {
            return Err(Error::runtime_with_context(
                format!("no unanswered tool request with id '{}'", tool_request_id),
                ErrorContext::new()
                    .with_details(format!("tool: {}", tool_name))
                    .with_source("transcript"),
            ));
        };
        self.unanswered.remove(pos);
        self.messages
            .push(Message::tool_result(tool_request_id, tool_name, result_text));
        Ok(())
    }

    fn ensure_settled(&self, what: &str) -> Result<()> {
        if self.unanswered.is_empty() {
            return Ok(());
        }
        Err(Error::runtime_with_context(
            format!("cannot append {} while tool requests are unanswered", what),
            ErrorContext::new()
                .with_details(self.unanswered.join(", "))
                .with_source("transcript"),
        ))
    }
}
