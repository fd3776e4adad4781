//! MCP client session over a JSON-RPC channel.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::jsonrpc::JsonRpcChannel;
use super::protocol::{CallToolResult, InitializeResult, ListToolsResult, ServerInfo, PROTOCOL_VERSION};
use super::ToolPeer;
use crate::types::tool::ToolDescriptor;
use crate::utils::IdAllocator;
use crate::{Error, ErrorContext, Result};

/// An initialized MCP session.
pub struct McpClient<R, W> {
    channel: Mutex<JsonRpcChannel<R, W>>,
    server_info: ServerInfo,
}

impl<R, W> McpClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Perform the `initialize` handshake on a fresh channel.
    ///
    /// Any failure here means the peer cannot be reached and is reported as
    /// [`Error::Discovery`].
    pub async fn connect(reader: R, writer: W, ids: Arc<dyn IdAllocator>) -> Result<Self> {
        let mut channel = JsonRpcChannel::new(reader, writer, ids);

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        let reply = channel
            .request("initialize", params)
            .await
            .map_err(|e| discovery_error("initialize handshake failed", e.to_string()))?
            .map_err(|e| discovery_error("peer rejected initialize", e.to_string()))?;

        let init: InitializeResult = serde_json::from_value(reply)
            .map_err(|e| discovery_error("malformed initialize reply", e.to_string()))?;
        let server_info = init.server_info.unwrap_or_default();

        channel
            .notify("notifications/initialized", json!({}))
            .await
            .map_err(|e| discovery_error("initialized notification failed", e.to_string()))?;

        info!(
            server = %server_info.name,
            version = %server_info.version,
            protocol = init.protocol_version.as_deref().unwrap_or("unknown"),
            "MCP session initialized"
        );

        Ok(Self {
            channel: Mutex::new(channel),
            server_info,
        })
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Close the write half so the peer sees end of input.
    pub async fn close(&self) {
        self.channel.lock().await.close().await;
    }
}

#[async_trait]
impl<R, W> ToolPeer for McpClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut channel = self.channel.lock().await;
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let reply = channel
                .request("tools/list", params)
                .await
                .map_err(|e| discovery_error("tools/list failed", e.to_string()))?
                .map_err(|e| discovery_error("peer rejected tools/list", e.to_string()))?;

            let page: ListToolsResult = serde_json::from_value(reply)
                .map_err(|e| discovery_error("malformed tools/list reply", e.to_string()))?;
            debug!(count = page.tools.len(), "received tools/list page");
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen_cursors.insert(next.clone()) {
                        return Err(discovery_error("peer repeated tools/list cursor", next));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        let params = json!({ "name": name, "arguments": Value::Object(arguments) });
        let reply = self
            .channel
            .lock()
            .await
            .request("tools/call", params)
            .await?
            .map_err(|e| Error::invocation(name, e.to_string()))?;

        serde_json::from_value(reply).map_err(|e| {
            Error::protocol_with_context(
                format!("malformed tools/call reply for '{}'", name),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("mcp_client"),
            )
        })
    }

    async fn shutdown(&self) -> Result<()> {
        self.close().await;
        Ok(())
    }
}

fn discovery_error(msg: &str, details: String) -> Error {
    Error::discovery_with_context(
        msg,
        ErrorContext::new()
            .with_details(details)
            .with_source("mcp_client"),
    )
}
