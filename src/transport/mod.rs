//! Network transports used by the agent.
//!
//! The model API is reached over HTTP ([`http::HttpTransport`]); the tool peer
//! speaks newline-delimited JSON-RPC over a child process's stdio (see
//! [`crate::mcp::jsonrpc`]). Both report failures through [`TransportError`].

pub mod http;

pub use http::{HttpOptions, HttpTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Line framing error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("Tool peer closed the connection")]
    PeerClosed,

    #[error("Transport error: {0}")]
    Other(String),
}
