//! Tool calling definitions shared by the tool peer and the model API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Reserved argument key carrying model output that was not a JSON object.
pub const RAW_ARGUMENTS_KEY: &str = "_raw";

/// Placeholder used when a peer tool has no description.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "No description";

/// Tool metadata as discovered from the tool peer (`tools/list`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a session.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema describing the tool's arguments.
    #[serde(
        default,
        rename = "inputSchema",
        alias = "input_schema",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameter_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameter_schema = Some(schema);
        self
    }
}

/// Tool definition in the chat API's calling convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Correlation id generated by the model.
    pub id: String,
    pub tool_name: String,
    pub arguments: ToolArguments,
    /// Argument text exactly as the model wrote it; echoed back in the transcript.
    #[serde(default)]
    pub raw_arguments: String,
}

impl ToolRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: ToolArguments) -> Self {
        let raw_arguments = arguments.to_wire();
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
            raw_arguments,
        }
    }

    /// Decode model argument text, keeping the text itself untouched.
    pub fn from_wire(id: impl Into<String>, tool_name: impl Into<String>, raw_arguments: &str) -> Self {
        let tool_name = tool_name.into();
        Self {
            id: id.into(),
            arguments: ToolArguments::from_wire(&tool_name, raw_arguments),
            tool_name,
            raw_arguments: raw_arguments.to_string(),
        }
    }
}

/// Arguments of a [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Structured(Map<String, Value>),
    /// Model output that did not decode to a JSON object, kept verbatim.
    Raw(String),
}

impl ToolArguments {
    /// Decode argument text into a JSON object.
    ///
    /// Blank text is an empty object. Anything else that is not a JSON object
    /// is an [`Error::ArgumentParse`].
    pub fn parse(tool: &str, raw: &str) -> Result<Map<String, Value>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::ArgumentParse {
                tool: tool.to_string(),
                reason: format!("expected an object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(Error::ArgumentParse {
                tool: tool.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Decode argument text, keeping it as [`ToolArguments::Raw`] when it is not an object.
    pub fn from_wire(tool: &str, raw: &str) -> Self {
        match Self::parse(tool, raw) {
            Ok(map) => ToolArguments::Structured(map),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to raw tool arguments");
                ToolArguments::Raw(raw.to_string())
            }
        }
    }

    /// The mapping handed to the tool peer. Raw text travels under [`RAW_ARGUMENTS_KEY`].
    pub fn to_mapping(&self) -> Map<String, Value> {
        match self {
            ToolArguments::Structured(map) => map.clone(),
            ToolArguments::Raw(raw) => {
                let mut map = Map::new();
                map.insert(RAW_ARGUMENTS_KEY.to_string(), Value::String(raw.clone()));
                map
            }
        }
    }

    /// Argument text as sent back to the model in the assistant message.
    pub fn to_wire(&self) -> String {
        match self {
            ToolArguments::Structured(map) => Value::Object(map.clone()).to_string(),
            ToolArguments::Raw(raw) => raw.clone(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
