//! Conversation messages

use serde::{Deserialize, Serialize};

use super::tool::ToolRequest;

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        text: String,
    },
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_requests: Vec<ToolRequest>,
    },
    Tool {
        tool_request_id: String,
        tool_name: String,
        result_text: String,
    },
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Message::System { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant {
            text: text.into(),
            tool_requests: Vec::new(),
        }
    }

    pub fn assistant_with_tools(text: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Self {
        Message::Assistant {
            text: text.into(),
            tool_requests,
        }
    }

    pub fn tool_result(
        tool_request_id: impl Into<String>,
        tool_name: impl Into<String>,
        result_text: impl Into<String>,
    ) -> Self {
        Message::Tool {
            tool_request_id: tool_request_id.into(),
            tool_name: tool_name.into(),
            result_text: result_text.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Message::System { .. } => MessageRole::System,
            Message::User { .. } => MessageRole::User,
            Message::Assistant { .. } => MessageRole::Assistant,
            Message::Tool { .. } => MessageRole::Tool,
        }
    }

    /// Textual content of the message (the tool result for tool messages).
    pub fn text(&self) -> &str {
        match self {
            Message::System { text } | Message::User { text } | Message::Assistant { text, .. } => {
                text
            }
            Message::Tool { result_text, .. } => result_text,
        }
    }

    /// Tool requests carried by an assistant message; empty for every other role.
    pub fn tool_requests(&self) -> &[ToolRequest] {
        match self {
            Message::Assistant { tool_requests, .. } => tool_requests,
            _ => &[],
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}
