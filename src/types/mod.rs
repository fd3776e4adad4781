//! Core data types shared by the agent, the tool peer and the model client.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Transcript entry, tagged by role |
//! | [`ToolDescriptor`] | Tool metadata discovered from the tool peer |
//! | [`ToolDefinition`] | Tool in the chat API's calling convention |
//! | [`ToolRequest`] | Tool call requested by the model |
//! | [`ToolArguments`] | Structured arguments, or raw text when decoding failed |
//!
//! ```rust
//! use mcp_chat_agent::types::{Message, ToolArguments};
//!
//! let system = Message::system("You are a calendar assistant.");
//! let args = ToolArguments::from_wire("create_event", "{bad");
//! assert_eq!(args.to_mapping()["_raw"], "{bad");
//! ```

pub mod message;
pub mod tool;

pub use message::{Message, MessageRole};
pub use tool::{FunctionDefinition, ToolArguments, ToolDefinition, ToolDescriptor, ToolRequest};
