//! Newline-delimited JSON-RPC 2.0 channel.
//!
//! One JSON document per line in each direction. Replies are matched to
//! requests by id. Peer-initiated requests read while waiting are answered
//! (`ping` with an empty result, anything else with "method not found");
//! notifications, replies to cancelled requests and stray log output are
//! skipped.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, warn};

use crate::transport::TransportError;
use crate::utils::IdAllocator;
use crate::Result;

const JSONRPC_VERSION: &str = "2.0";
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct Incoming {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Error object of a JSON-RPC reply.
#[derive(Debug, Clone, PartialEq, Deserialize, thiserror::Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

pub struct JsonRpcChannel<R, W> {
    reader: FramedRead<R, LinesCodec>,
    writer: Option<FramedWrite<W, LinesCodec>>,
    ids: Arc<dyn IdAllocator>,
}

impl<R, W> JsonRpcChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, ids: Arc<dyn IdAllocator>) -> Self {
        Self {
            reader: FramedRead::new(reader, LinesCodec::new()),
            writer: Some(FramedWrite::new(writer, LinesCodec::new())),
            ids,
        }
    }

    /// Send a request and wait for its reply.
    ///
    /// The outer result reports channel failures; the inner one carries the
    /// peer's JSON-RPC error, if any.
    pub async fn request(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<std::result::Result<Value, RpcError>> {
        let id = self.ids.next_id();
        let line = serde_json::to_string(&Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        })?;
        debug!(id, method, "sending JSON-RPC request");
        self.send_line(line).await?;

        loop {
            let line = match self.reader.next().await {
                Some(line) => line.map_err(TransportError::from)?,
                None => return Err(TransportError::PeerClosed.into()),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let incoming: Incoming = match serde_json::from_str(line) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "skipping non JSON-RPC output from tool peer");
                    continue;
                }
            };

            if let Some(peer_method) = incoming.method.as_deref() {
                match incoming.id {
                    Some(peer_id) => self.answer_peer(peer_method, peer_id).await?,
                    None => debug!(method = peer_method, "ignoring peer notification"),
                }
                continue;
            }

            if incoming.id.as_ref().and_then(Value::as_u64) != Some(id) {
                debug!(expected = id, got = ?incoming.id, "discarding unmatched reply");
                continue;
            }

            if let Some(err) = incoming.error {
                return Ok(Err(err));
            }
            return Ok(Ok(incoming.result.unwrap_or(Value::Null)));
        }
    }

    /// Send a notification (no reply expected).
    pub async fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        let line = serde_json::to_string(&Notification {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        })?;
        self.send_line(line).await
    }

    /// Flush and drop the write half, signalling end of input to the peer.
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = SinkExt::<String>::close(&mut writer).await {
                debug!(error = %e, "error while closing tool peer input");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Reply to a request the peer sent us. Only `ping` is supported.
    async fn answer_peer(&mut self, method: &str, id: Value) -> Result<()> {
        let reply = if method == "ping" {
            json!({"jsonrpc": JSONRPC_VERSION, "id": id, "result": {}})
        } else {
            debug!(method, "rejecting unsupported peer request");
            json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "error": {"code": METHOD_NOT_FOUND, "message": "Method not found"}
            })
        };
        self.send_line(reply.to_string()).await
    }

    async fn send_line(&mut self, line: String) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(TransportError::PeerClosed)?;
        writer.send(line).await.map_err(TransportError::from)?;
        Ok(())
    }
}
