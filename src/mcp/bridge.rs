//! Tool registry: discovers tools from the peer, converts them to the chat
//! API's calling convention, and invokes them.

use std::collections::HashSet;
use std::time::Duration;

use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::ToolPeer;
use crate::types::tool::{FunctionDefinition, ToolDefinition, ToolDescriptor, DEFAULT_TOOL_DESCRIPTION};
use crate::{Error, ErrorContext, Result};

/// Convert discovered tools to the chat API's calling convention.
///
/// Missing descriptions become [`DEFAULT_TOOL_DESCRIPTION`]; missing schemas
/// become the empty-object schema.
pub fn convert(descriptors: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    descriptors.iter().map(convert_tool).collect()
}

fn convert_tool(tool: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string()),
            parameters: tool
                .parameter_schema
                .clone()
                .unwrap_or_else(|| json!({ "type": "object" })),
        },
    }
}

/// Tools offered by one peer for the lifetime of a session.
pub struct ToolRegistry {
    peer: Box<dyn ToolPeer>,
    tools: Vec<ToolDescriptor>,
    /// Allowed tools (empty = all allowed).
    allow_filter: HashSet<String>,
    /// Denied tools.
    deny_filter: HashSet<String>,
    call_timeout: Option<Duration>,
}

impl ToolRegistry {
    pub fn new(peer: Box<dyn ToolPeer>) -> Self {
        Self {
            peer,
            tools: Vec::new(),
            allow_filter: HashSet::new(),
            deny_filter: HashSet::new(),
            call_timeout: None,
        }
    }

    /// Set allowed tools filter.
    pub fn with_allow_filter(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.allow_filter = tools.into_iter().collect();
        self
    }

    /// Set denied tools filter.
    pub fn with_deny_filter(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.deny_filter = tools.into_iter().collect();
        self
    }

    /// Bound every tool call; `None` waits indefinitely.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Fetch and validate the peer's tools.
    ///
    /// Fails with [`Error::Discovery`] when the peer cannot be reached, a tool
    /// name is empty or repeated, or a schema is not a compilable JSON Schema
    /// object.
    pub async fn discover(&mut self) -> Result<Vec<ToolDescriptor>> {
        let listed = self.peer.list_tools().await.map_err(|e| match e {
            Error::Discovery { .. } => e,
            other => Error::discovery_with_context(
                "tool peer unreachable",
                ErrorContext::new()
                    .with_details(other.to_string())
                    .with_source("tool_registry"),
            ),
        })?;

        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(listed.len());
        for (idx, tool) in listed.into_iter().enumerate() {
            validate_descriptor(idx, &tool, &mut seen)?;
            if self.is_tool_allowed(&tool.name) {
                tools.push(tool);
            } else {
                debug!(tool = %tool.name, "tool filtered out");
            }
        }

        info!(count = tools.len(), "discovered tools");
        self.tools = tools.clone();
        Ok(tools)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Discovered tools in the chat API's calling convention.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        convert(&self.tools)
    }

    /// Call a tool and flatten its result to text.
    ///
    /// Peer faults, results flagged as errors and timeouts are returned as
    /// errors; the caller decides how to surface them.
    pub async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> Result<String> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(Error::invocation(name, "no such tool in this session"));
        }
        debug!(tool = name, "invoking tool");
        let call = self.peer.call_tool(name, arguments);
        let outcome = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(Error::Timeout {
                        operation: format!("tool '{}'", name),
                        elapsed_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => call.await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e @ Error::Invocation { .. }) | Err(e @ Error::Timeout { .. }) => return Err(e),
            Err(other) => return Err(Error::invocation(name, other.to_string())),
        };

        let text = result.flatten();
        if result.is_error {
            return Err(Error::invocation(name, text));
        }
        Ok(text)
    }

    /// Release the peer connection.
    pub async fn shutdown(&self) -> Result<()> {
        self.peer.shutdown().await
    }

    /// Check if a tool name passes the allow/deny filters.
    fn is_tool_allowed(&self, name: &str) -> bool {
        if !self.deny_filter.is_empty() && self.deny_filter.contains(name) {
            return false;
        }
        if !self.allow_filter.is_empty() {
            return self.allow_filter.contains(name);
        }
        true
    }
}

fn validate_descriptor(idx: usize, tool: &ToolDescriptor, seen: &mut HashSet<String>) -> Result<()> {
    if tool.name.trim().is_empty() {
        return Err(Error::discovery_with_context(
            "tool name is empty",
            ErrorContext::new()
                .with_field_path(format!("tools[{}].name", idx))
                .with_source("tool_registry"),
        ));
    }
    if !seen.insert(tool.name.clone()) {
        return Err(Error::discovery_with_context(
            format!("duplicate tool name '{}'", tool.name),
            ErrorContext::new()
                .with_field_path(format!("tools[{}].name", idx))
                .with_source("tool_registry"),
        ));
    }

    let Some(schema) = &tool.parameter_schema else {
        return Ok(());
    };
    let field = format!("tools[{}].inputSchema", idx);
    if !schema.is_object() {
        return Err(Error::discovery_with_context(
            format!("schema of '{}' is not an object", tool.name),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("tool_registry"),
        ));
    }
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| {
            Error::discovery_with_context(
                format!("schema of '{}' does not compile", tool.name),
                ErrorContext::new()
                    .with_field_path(field.clone())
                    .with_details(e.to_string())
                    .with_source("tool_registry"),
            )
        })?;
    Ok(())
}
