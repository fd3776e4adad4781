//! mcp-chat — 交互式日历助手命令行
//!
//! Usage:
//!   mcp-chat <tool-server>     Launch the MCP tool server and start chatting
//!   mcp-chat --help            Show usage

use std::sync::Arc;

use anyhow::Context;
use mcp_chat_agent::agent::{ConversationDriver, Session};
use mcp_chat_agent::client::ChatClientBuilder;
use mcp_chat_agent::config::AgentConfig;
use mcp_chat_agent::mcp::{PeerCommand, StdioPeer, ToolRegistry};
use mcp_chat_agent::utils::MonotonicIds;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let server = match args.get(1).map(String::as_str) {
        None => {
            print_usage();
            std::process::exit(1);
        }
        Some("help" | "--help" | "-h") => {
            print_usage();
            return;
        }
        Some(path) => path.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&server).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"mcp-chat — chat with a model that calls tools on an MCP server

USAGE:
    mcp-chat <tool-server>

ARGS:
    <tool-server>    Path of the MCP server to launch over stdio.
                     *.py runs under python with the `stdio` argument,
                     *.js under node, anything else is executed directly.

ENVIRONMENT (also read from ./.env):
    GROQ_API_KEY               API key (falls back to the OS keyring)
    GROQ_MODEL                 Model id [default: openai/gpt-oss-20b]
    GROQ_BASE_URL              Chat API base [default: https://api.groq.com/openai/v1]
    AGENT_MAX_ROUNDS           Model calls per request [default: 5]
    AGENT_MODEL_TIMEOUT_SECS   Model call timeout, 0 disables [default: 120]
    AGENT_TOOL_TIMEOUT_SECS    Tool call timeout, 0 disables [default: 60]
    AGENT_HTTP_CONNECT_TIMEOUT_SECS
                               Chat API connect timeout, 0 disables [default: 10]
    AGENT_PROXY_URL            Proxy for chat API requests
    AGENT_SYSTEM_PROMPT        Replace the default system prompt
    AGENT_TOOL_ALLOW           Comma-separated tools to offer
    AGENT_TOOL_DENY            Comma-separated tools to hide
    AGENT_CONFIG               YAML file with the same settings
    MCP_PYTHON                 Interpreter for *.py servers [default: python]
    RUST_LOG                   Log filter (logs go to stderr)"#
    );
}

async fn run(server: &str) -> anyhow::Result<()> {
    let config = AgentConfig::load().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let mut command = PeerCommand::for_path(server, &config.python);
    for (key, value) in &config.peer_env {
        command = command.env(key, value);
    }

    let model = ChatClientBuilder::new()
        .base_url(config.base_url.clone())
        .model(config.model.clone())
        .api_key(config.api_key.clone())
        .connect_timeout(config.http_connect_timeout)
        .proxy(config.proxy_url.clone())
        .build()
        .context("configuring the chat model client")?;

    let peer = StdioPeer::spawn(command, Arc::new(MonotonicIds::new()))
        .await
        .context("starting the tool server")?;

    let mut registry = ToolRegistry::new(Box::new(peer))
        .with_allow_filter(config.tool_allow.clone())
        .with_deny_filter(config.tool_deny.clone())
        .with_call_timeout(config.tool_timeout);

    if let Err(e) = registry.discover().await {
        let _ = registry.shutdown().await;
        return Err(e).context("discovering tools");
    }

    let driver = ConversationDriver::new(Box::new(model), registry)
        .with_max_rounds(config.max_rounds)
        .with_model_timeout(config.model_timeout);

    let mut session = Session::new(driver, config.system_prompt.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let end = session.run(stdin, &mut stdout).await?;
    tracing::info!(?end, "session ended");
    Ok(())
}
