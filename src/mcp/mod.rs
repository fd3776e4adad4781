//! MCP 工具对端 — tool peer access over the Model Context Protocol
//!
//! This module handles:
//! - The [`ToolPeer`] seam: the two operations the agent needs from a tool server
//! - Newline-delimited JSON-RPC framing ([`jsonrpc`])
//! - The MCP session handshake, `tools/list` and `tools/call` ([`client`])
//! - Launching and shutting down a peer process over stdio ([`stdio`])
//! - Discovery, conversion to the chat API's tool format, and invocation ([`bridge`])

pub mod bridge;
pub mod client;
pub mod jsonrpc;
pub mod protocol;
pub mod stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::tool::ToolDescriptor;
use crate::Result;

pub use bridge::{convert, ToolRegistry};
pub use client::McpClient;
pub use protocol::{CallToolResult, ContentBlock};
pub use stdio::{PeerCommand, StdioPeer};

/// A tool-providing peer.
#[async_trait]
pub trait ToolPeer: Send + Sync {
    /// List the peer's tools in the order it reports them.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke one tool with an argument object.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult>;

    /// Release the connection. Further calls fail.
    async fn shutdown(&self) -> Result<()>;
}
