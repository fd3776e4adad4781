//! Scripted fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcp_chat_agent::client::{AssistantTurn, ChatModel};
use mcp_chat_agent::drivers::CompletionRequest;
use mcp_chat_agent::mcp::{CallToolResult, ToolPeer};
use mcp_chat_agent::types::{Message, ToolDescriptor, ToolRequest};
use mcp_chat_agent::{Error, ErrorContext, Result};
use serde_json::{json, Map, Value};

/// Model that replays a fixed list of turns and records every request.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<AssistantTurn>>,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<AssistantTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A model that requests the same tool forever.
    pub fn always_calling(tool: &str, rounds: usize) -> Self {
        let turns = (0..rounds)
            .map(|i| AssistantTurn::tool_calls(vec![call(&format!("call_{i}"), tool, "{}")]))
            .collect();
        Self::new(turns)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<AssistantTurn> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.messages.to_vec());
        self.turns.lock().unwrap().pop_front().ok_or_else(|| {
            Error::runtime_with_context("model script exhausted", ErrorContext::new())
        })
    }
}

type Handler = Box<dyn Fn(&str, &Map<String, Value>) -> Result<CallToolResult> + Send + Sync>;

/// Tool peer answering calls through a closure and recording them.
pub struct FakePeer {
    tools: Vec<ToolDescriptor>,
    handler: Handler,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    pub shut_down: Arc<AtomicBool>,
}

impl FakePeer {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self::with_handler(tools, |name, _| Ok(CallToolResult::text(format!("{name} ok"))))
    }

    pub fn with_handler(
        tools: Vec<ToolDescriptor>,
        handler: impl Fn(&str, &Map<String, Value>) -> Result<CallToolResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            tools,
            handler: Box::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl ToolPeer for FakePeer {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), Value::Object(arguments.clone())));
        (self.handler)(name, &arguments)
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn call(id: &str, tool: &str, raw_arguments: &str) -> ToolRequest {
    ToolRequest::from_wire(id, tool, raw_arguments)
}

pub fn calendar_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("create_event")
            .with_description("Create a Google Calendar event")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "start": {"type": "string"},
                    "duration_minutes": {"type": "integer"}
                },
                "required": ["title", "start"]
            })),
        ToolDescriptor::new("list_upcoming").with_description("List upcoming events"),
        ToolDescriptor::new("cancel_event").with_schema(json!({
            "type": "object",
            "properties": {"event_id": {"type": "string"}}
        })),
        ToolDescriptor::new("X"),
    ]
}
