//! # mcp-chat-agent
//!
//! 交互式工具调用代理：通过 MCP 驱动工具服务器，通过 OpenAI 兼容 API 驱动模型。
//!
//! Interactive tool-calling chat agent. A user types requests at a prompt; a
//! language model reached through an OpenAI-compatible chat API decides which
//! tools to call; the tools live in a separate MCP server process spoken to
//! over stdio.
//!
//! ## Overview
//!
//! Each user turn runs a bounded loop: the model sees the whole transcript and
//! the tool catalog, may request tool calls, the calls are dispatched to the
//! tool peer one at a time, and their results are fed back until the model
//! answers in plain text or the round limit is reached.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_chat_agent::agent::{ConversationDriver, Session};
//! use mcp_chat_agent::client::ChatClientBuilder;
//! use mcp_chat_agent::mcp::{PeerCommand, StdioPeer, ToolRegistry};
//! use mcp_chat_agent::utils::MonotonicIds;
//!
//! #[tokio::main]
//! async fn main() -> mcp_chat_agent::Result<()> {
//!     let peer = StdioPeer::spawn(
//!         PeerCommand::for_path("gcal_mcp_server.py", "python"),
//!         Arc::new(MonotonicIds::new()),
//!     )
//!     .await?;
//!     let mut registry = ToolRegistry::new(Box::new(peer));
//!     registry.discover().await?;
//!
//!     let model = ChatClientBuilder::new()
//!         .api_key(std::env::var("GROQ_API_KEY").ok())
//!         .build()?;
//!     let driver = ConversationDriver::new(Box::new(model), registry);
//!
//!     let mut session = Session::new(driver, mcp_chat_agent::agent::DEFAULT_SYSTEM_PROMPT);
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     session.run(stdin, &mut tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages, tool descriptors, tool requests and arguments |
//! | [`mcp`] | Tool peer over MCP/stdio and the tool registry |
//! | [`drivers`] | OpenAI-compatible request/response encoding |
//! | [`transport`] | HTTP transport for the chat API |
//! | [`client`] | The [`client::ChatModel`] seam and its HTTP client |
//! | [`agent`] | Transcript, conversation driver and interactive session |
//! | [`config`] | Layered configuration (YAML, `.env`, environment, keyring) |
//! | [`utils`] | Id allocation |

pub mod agent;
pub mod client;
pub mod config;
pub mod drivers;
pub mod mcp;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use agent::{ConversationDriver, Session, Transcript, TurnOutcome};
pub use client::{ChatClient, ChatClientBuilder, ChatModel};
pub use config::AgentConfig;
pub use mcp::{ToolPeer, ToolRegistry};
pub use types::{
    message::{Message, MessageRole},
    tool::{ToolArguments, ToolDescriptor, ToolRequest},
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
