//! MCP wire types used by the client session.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::types::tool::ToolDescriptor;

/// MCP revision announced in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// One block of a `tools/call` result.
///
/// Blocks are classified once when decoded: an object with `"type": "text"`
/// and a string `"text"` is [`ContentBlock::Text`], anything else is kept
/// whole as [`ContentBlock::Opaque`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    Opaque(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(text.into())
    }

    pub fn from_value(value: Value) -> Self {
        let is_text = value.get("type").and_then(|t| t.as_str()) == Some("text");
        match value.get("text").and_then(|t| t.as_str()) {
            Some(text) if is_text => ContentBlock::Text(text.to_string()),
            _ => ContentBlock::Opaque(value),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ContentBlock::Text(text) => serde_json::json!({ "type": "text", "text": text }),
            ContentBlock::Opaque(value) => value.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ContentBlock::from_value)
    }
}

impl Serialize for ContentBlock {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

/// Result payload of `tools/call`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Set by the peer when the tool itself failed.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
    #[serde(
        default,
        rename = "structuredContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Join all non-empty text blocks with newlines.
    ///
    /// Without any text the whole payload is rendered as compact JSON, so the
    /// result is never an empty string.
    pub fn flatten(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
        } else {
            parts.join("\n")
        }
    }
}

/// Result payload of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Identity reported by the peer in its `initialize` reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(default, rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(default, rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}
