//! Provider driver abstraction for OpenAI-compatible chat completion APIs.
//!
//! A driver turns the transcript and the tool catalog into a request body and
//! a response body back into an assistant turn. It owns no I/O; the
//! [`crate::client::ChatClient`] sends what the driver builds.

use serde_json::{json, Map, Value};

use crate::error::{Error, ErrorContext};
use crate::types::message::Message;
use crate::types::tool::{ToolArguments, ToolDefinition, ToolRequest};

/// Path of the chat completions endpoint, relative to the API base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// How the model may use the offered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// The model decides whether to call tools.
    #[default]
    Auto,
    None,
    Required,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Required => "required",
        }
    }
}

/// Unified parameters of one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model_id: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
    pub temperature: f64,
    pub tool_choice: ToolChoice,
}

impl<'a> CompletionRequest<'a> {
    /// Deterministic request with automatic tool choice.
    pub fn new(model_id: &'a str, messages: &'a [Message], tools: &'a [ToolDefinition]) -> Self {
        Self {
            model_id,
            messages,
            tools,
            temperature: 0.0,
            tool_choice: ToolChoice::Auto,
        }
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

/// Provider request ready to be posted.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Endpoint path relative to the base URL.
    pub path: String,
    /// Serialized JSON request body.
    pub body: Value,
}

/// Unified chat response from provider.
#[derive(Debug, Clone, Default)]
pub struct DriverResponse {
    /// Extracted text content.
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
    /// Tool calls in the order the model listed them.
    pub tool_requests: Vec<ToolRequest>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Provider-specific wire adaptation.
///
/// Object safe so the client can hold a `Box<dyn ProviderDriver>`.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Identifier used in logs and key lookup.
    fn provider_id(&self) -> &str;

    fn build_request(&self, request: &CompletionRequest<'_>) -> Result<DriverRequest, Error>;

    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error>;
}

/// OpenAI-compatible driver (Groq, OpenAI, and other `/chat/completions` providers).
#[derive(Debug, Clone)]
pub struct OpenAiDriver {
    provider_id: String,
}

impl OpenAiDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }
}

impl ProviderDriver for OpenAiDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn build_request(&self, request: &CompletionRequest<'_>) -> Result<DriverRequest, Error> {
        let messages: Vec<Value> = request.messages.iter().map(encode_message).collect();

        let mut body = json!({
            "model": request.model_id,
            "messages": messages,
            "temperature": request.temperature,
        });

        // Some providers reject `tool_choice` without `tools`.
        if !request.tools.is_empty() {
            body["tools"] = serde_json::to_value(request.tools)?;
            body["tool_choice"] = json!(request.tool_choice.as_str());
        }

        Ok(DriverRequest {
            path: CHAT_COMPLETIONS_PATH.to_string(),
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error> {
        let message = body.pointer("/choices/0/message").ok_or_else(|| {
            malformed("response has no choices", "choices[0].message", body)
        })?;

        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .map(String::from);
        let finish_reason = body
            .pointer("/choices/0/finish_reason")
            .and_then(|v| v.as_str())
            .map(String::from);
        let usage = body.get("usage").map(|u| UsageInfo {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0),
        });

        let tool_requests = match message.get("tool_calls") {
            Some(Value::Array(calls)) => calls
                .iter()
                .enumerate()
                .map(|(idx, call)| decode_tool_call(idx, call))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(DriverResponse {
            content,
            finish_reason,
            usage,
            tool_requests,
        })
    }
}

fn encode_message(message: &Message) -> Value {
    match message {
        Message::System { text } => json!({ "role": "system", "content": text }),
        Message::User { text } => json!({ "role": "user", "content": text }),
        Message::Assistant {
            text,
            tool_requests,
        } => {
            let mut obj = json!({ "role": "assistant", "content": text });
            if !tool_requests.is_empty() {
                let calls: Vec<Value> = tool_requests
                    .iter()
                    .map(|req| {
                        json!({
                            "id": req.id,
                            "type": "function",
                            "function": {
                                "name": req.tool_name,
                                "arguments": req.raw_arguments,
                            }
                        })
                    })
                    .collect();
                obj["tool_calls"] = Value::Array(calls);
            }
            obj
        }
        Message::Tool {
            tool_request_id,
            tool_name,
            result_text,
        } => json!({
            "role": "tool",
            "tool_call_id": tool_request_id,
            "name": tool_name,
            "content": result_text,
        }),
    }
}

fn decode_tool_call(idx: usize, call: &Value) -> Result<ToolRequest, Error> {
    let field = |name: &str| format!("choices[0].message.tool_calls[{}].{}", idx, name);

    let id = call
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("tool call without id", &field("id"), call))?;
    let name = call
        .pointer("/function/name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("tool call without function name", &field("function.name"), call))?;

    // Arguments are normally a JSON-encoded string; some providers send the object itself.
    match call.pointer("/function/arguments") {
        None | Some(Value::Null) => Ok(ToolRequest::new(id, name, ToolArguments::Structured(Map::new()))),
        Some(Value::String(raw)) => Ok(ToolRequest::from_wire(id, name, raw)),
        Some(other) => Ok(ToolRequest::from_wire(id, name, &other.to_string())),
    }
}

fn malformed(msg: &str, field_path: &str, payload: &Value) -> Error {
    Error::protocol_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field_path)
            .with_details(payload.to_string())
            .with_source("openai_driver"),
    )
}
