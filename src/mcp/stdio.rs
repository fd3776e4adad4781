//! Tool peer running as a child process, spoken to over its stdio.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::client::McpClient;
use super::protocol::{CallToolResult, ServerInfo};
use super::ToolPeer;
use crate::types::tool::ToolDescriptor;
use crate::utils::IdAllocator;
use crate::{Error, ErrorContext, Result};

/// How long a peer may take to exit after its stdin is closed before it is killed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Command line used to launch a tool peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl PeerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Launch rule for a peer given on the command line.
    ///
    /// `*.py` runs under `python` with the `stdio` transport argument, `*.js`
    /// under `node`; anything else is executed directly.
    pub fn for_path(path: &str, python: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "py" => Self::new(python).arg(path).arg("stdio"),
            "js" | "mjs" => Self::new("node").arg(path),
            _ => Self::new(path),
        }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A spawned tool peer process with an initialized MCP session.
pub struct StdioPeer {
    command: PeerCommand,
    client: McpClient<ChildStdout, ChildStdin>,
    child: Mutex<Option<Child>>,
    shutdown_grace: Duration,
}

impl StdioPeer {
    /// Spawn the peer and perform the MCP handshake.
    pub async fn spawn(command: PeerCommand, ids: Arc<dyn IdAllocator>) -> Result<Self> {
        info!(command = %command.display(), "spawning tool peer");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // peer logs go to our stderr
            .kill_on_drop(true);
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::discovery_with_context(
                format!("failed to spawn tool peer '{}'", command.display()),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("stdio_peer"),
            )
        })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill().await;
                return Err(Error::discovery_with_context(
                    "tool peer stdio was not captured",
                    ErrorContext::new().with_source("stdio_peer"),
                ));
            }
        };

        let client = match McpClient::connect(stdout, stdin, ids).await {
            Ok(client) => client,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e);
            }
        };

        Ok(Self {
            command,
            client,
            child: Mutex::new(Some(child)),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        })
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn command(&self) -> &PeerCommand {
        &self.command
    }

    pub fn server_info(&self) -> &ServerInfo {
        self.client.server_info()
    }

    /// Exit status text if the peer process has already terminated.
    async fn exited(&self) -> Option<String> {
        let mut guard = self.child.lock().await;
        let child = guard.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => Some(e.to_string()),
        }
    }
}

#[async_trait]
impl ToolPeer for StdioPeer {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.client.list_tools().await
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        if let Some(status) = self.exited().await {
            return Err(Error::invocation(
                name,
                format!("tool peer '{}' has exited ({})", self.command.display(), status),
            ));
        }
        self.client.call_tool(name, arguments).await
    }

    /// Close the peer's stdin, give it a grace period to exit, then kill it.
    async fn shutdown(&self) -> Result<()> {
        self.client.close().await;

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(command = %self.command.display(), %status, "tool peer exited");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to wait for tool peer");
            }
            Err(_) => {
                warn!(
                    command = %self.command.display(),
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "tool peer did not exit after stdin closed, killing"
                );
                child.kill().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_peer_gets_stdio_argument() {
        let cmd = PeerCommand::for_path("servers/gcal_mcp_server.py", "python3");
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["servers/gcal_mcp_server.py", "stdio"]);
        assert_eq!(cmd.display(), "python3 servers/gcal_mcp_server.py stdio");
    }

    #[test]
    fn test_other_peers_launch_directly_or_under_node() {
        let node = PeerCommand::for_path("server.JS", "python");
        assert_eq!(node.program, "node");
        assert_eq!(node.args, vec!["server.JS"]);

        let native = PeerCommand::for_path("/usr/local/bin/gcal-mcp", "python");
        assert_eq!(native, PeerCommand::new("/usr/local/bin/gcal-mcp"));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_discovery_error() {
        let cmd = PeerCommand::new("/nonexistent/definitely-not-a-peer");
        let err = StdioPeer::spawn(cmd, Arc::new(crate::utils::MonotonicIds::new()))
            .await
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("failed to spawn tool peer"));
    }
}
