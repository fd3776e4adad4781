//! Chat model client.
//!
//! [`ChatModel`] is the seam the conversation driver talks to; [`ChatClient`]
//! implements it over HTTP for OpenAI-compatible providers. Tests substitute
//! scripted models.

pub mod builder;
pub mod core;

pub use self::builder::ChatClientBuilder;
pub use self::core::ChatClient;

use async_trait::async_trait;

use crate::drivers::{CompletionRequest, UsageInfo};
use crate::types::tool::ToolRequest;
use crate::Result;

/// One assistant reply: text, tool requests, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTurn {
    /// Reply text; empty when the model only requested tools.
    pub text: String,
    pub tool_requests: Vec<ToolRequest>,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

impl AssistantTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn tool_calls(tool_requests: Vec<ToolRequest>) -> Self {
        Self {
            tool_requests,
            finish_reason: Some("tool_calls".to_string()),
            ..Default::default()
        }
    }

    pub fn has_tool_requests(&self) -> bool {
        !self.tool_requests.is_empty()
    }
}

/// A model that produces the next assistant turn for a transcript.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the model being called.
    fn model_id(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<AssistantTurn>;
}
