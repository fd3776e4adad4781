//! Agent configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file named by
//! `AGENT_CONFIG`, then environment keys. A `.env` file in the working
//! directory takes precedence over the process environment, and its entries
//! are also passed on to the tool peer's environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::agent::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::agent::DEFAULT_MAX_ROUNDS;
use crate::client::builder::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::transport::http::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

/// Keyring service and user consulted when no API key is configured.
pub const KEYRING_SERVICE: &str = "mcp-chat-agent";
pub const KEYRING_USER: &str = "groq";

/// Resolved settings for one run of the agent.
#[derive(Clone, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    /// Chat API base URL, validated as http(s).
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_rounds: usize,
    pub model_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub http_connect_timeout: Option<Duration>,
    /// Proxy for chat API traffic, validated as http(s).
    pub proxy_url: Option<String>,
    pub system_prompt: String,
    pub tool_allow: Vec<String>,
    pub tool_deny: Vec<String>,
    /// Interpreter used for `*.py` tool peers.
    pub python: String,
    /// Extra environment for the tool peer process.
    pub peer_env: Vec<(String, String)>,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_rounds", &self.max_rounds)
            .field("model_timeout", &self.model_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("http_connect_timeout", &self.http_connect_timeout)
            .field("proxy_url", &self.proxy_url)
            .field("tool_allow", &self.tool_allow)
            .field("tool_deny", &self.tool_deny)
            .field("python", &self.python)
            .field("peer_env", &self.peer_env.len())
            .finish()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            model_timeout: timeout_from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            tool_timeout: timeout_from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            http_connect_timeout: timeout_from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            proxy_url: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tool_allow: Vec::new(),
            tool_deny: Vec::new(),
            python: "python".to_string(),
            peer_env: Vec::new(),
        }
    }
}

/// Optional keys accepted in the YAML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    max_rounds: Option<usize>,
    model_timeout_secs: Option<u64>,
    tool_timeout_secs: Option<u64>,
    http_connect_timeout_secs: Option<u64>,
    proxy_url: Option<String>,
    system_prompt: Option<String>,
    tool_allow: Option<Vec<String>>,
    tool_deny: Option<Vec<String>>,
    python: Option<String>,
}

impl AgentConfig {
    /// Load from `.env`, the process environment, `AGENT_CONFIG` and the OS keyring.
    pub fn load() -> Result<Self> {
        let dotenv = EnvFile::from_path(".env")?.unwrap_or_default();
        let lookup = |key: &str| dotenv.get(key).or_else(|| std::env::var(key).ok());

        let yaml = match lookup("AGENT_CONFIG").filter(|p| !p.trim().is_empty()) {
            Some(path) => Some(fs::read_to_string(&path).map_err(|e| {
                Error::configuration_with_context(
                    format!("cannot read config file '{}'", path),
                    ErrorContext::new()
                        .with_field_path("AGENT_CONFIG")
                        .with_details(e.to_string()),
                )
            })?),
            None => None,
        };

        let mut config = Self::from_sources(yaml.as_deref(), lookup)?;
        if config.api_key.is_none() {
            config.api_key = HttpTransport::keyring_api_key(KEYRING_SERVICE, KEYRING_USER);
        }
        config.peer_env = dotenv.entries();
        Ok(config)
    }

    /// Resolve settings from optional YAML text and a key lookup.
    pub fn from_sources(yaml: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(text) = yaml {
            let file: FileConfig = serde_yaml::from_str(text).map_err(|e| {
                Error::configuration_with_context(
                    "invalid YAML configuration",
                    ErrorContext::new()
                        .with_field_path("AGENT_CONFIG")
                        .with_details(e.to_string()),
                )
            })?;
            config.apply_file(file)?;
        }

        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = lookup("GROQ_MODEL") {
            config.model = model.trim().to_string();
        }
        if let Some(url) = lookup("GROQ_BASE_URL") {
            config.base_url = parse_url("GROQ_BASE_URL", &url)?.to_string();
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            config.api_key = Some(key.trim().to_string());
        }
        if let Some(raw) = lookup("AGENT_MAX_ROUNDS") {
            config.max_rounds = parse_rounds("AGENT_MAX_ROUNDS", parse_number("AGENT_MAX_ROUNDS", &raw)?)?;
        }
        if let Some(raw) = lookup("AGENT_MODEL_TIMEOUT_SECS") {
            config.model_timeout = timeout_from_secs(parse_number("AGENT_MODEL_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("AGENT_TOOL_TIMEOUT_SECS") {
            config.tool_timeout = timeout_from_secs(parse_number("AGENT_TOOL_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("AGENT_HTTP_CONNECT_TIMEOUT_SECS") {
            config.http_connect_timeout =
                timeout_from_secs(parse_number("AGENT_HTTP_CONNECT_TIMEOUT_SECS", &raw)?);
        }
        if let Some(url) = lookup("AGENT_PROXY_URL") {
            config.proxy_url = Some(parse_url("AGENT_PROXY_URL", &url)?.to_string());
        }
        if let Some(prompt) = lookup("AGENT_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        if let Some(list) = lookup("AGENT_TOOL_ALLOW") {
            config.tool_allow = split_list(&list);
        }
        if let Some(list) = lookup("AGENT_TOOL_DENY") {
            config.tool_deny = split_list(&list);
        }
        if let Some(python) = lookup("MCP_PYTHON") {
            config.python = python.trim().to_string();
        }

        if config.model.is_empty() {
            return Err(Error::configuration_with_context(
                "model identifier is empty",
                ErrorContext::new().with_field_path("GROQ_MODEL"),
            ));
        }
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(url) = file.base_url {
            self.base_url = parse_url("base_url", &url)?.to_string();
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if let Some(rounds) = file.max_rounds {
            self.max_rounds = parse_rounds("max_rounds", rounds)?;
        }
        if let Some(secs) = file.model_timeout_secs {
            self.model_timeout = timeout_from_secs(secs);
        }
        if let Some(secs) = file.tool_timeout_secs {
            self.tool_timeout = timeout_from_secs(secs);
        }
        if let Some(secs) = file.http_connect_timeout_secs {
            self.http_connect_timeout = timeout_from_secs(secs);
        }
        if let Some(url) = file.proxy_url {
            self.proxy_url = Some(parse_url("proxy_url", &url)?.to_string());
        }
        if let Some(prompt) = file.system_prompt {
            self.system_prompt = prompt;
        }
        if let Some(allow) = file.tool_allow {
            self.tool_allow = allow;
        }
        if let Some(deny) = file.tool_deny {
            self.tool_deny = deny;
        }
        if let Some(python) = file.python {
            self.python = python;
        }
        Ok(())
    }
}

/// `KEY=VALUE` file with `#` comments, optional `export ` prefixes and quoted values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvFile {
    values: HashMap<String, String>,
    order: Vec<String>,
}

impl EnvFile {
    /// Read a file; a missing file is `Ok(None)`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::configuration_with_context(
                format!("cannot read {}", path.display()),
                ErrorContext::new().with_details(e.to_string()),
            )),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut file = Self::default();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(Error::configuration_with_context(
                    format!("invalid line {} in env file", idx + 1),
                    ErrorContext::new().with_details(line.to_string()),
                ));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::configuration_with_context(
                    format!("empty key on line {} in env file", idx + 1),
                    ErrorContext::new().with_details(line.to_string()),
                ));
            }
            let value = unquote(value.trim());
            if file.values.insert(key.to_string(), value.to_string()).is_none() {
                file.order.push(key.to_string());
            }
        }
        Ok(file)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// Entries in first-seen order, last value winning.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL '{}'", raw.trim()),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string()),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration_with_context(
            format!("unsupported URL scheme '{}'", url.scheme()),
            ErrorContext::new().with_field_path(field),
        ));
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        Error::configuration_with_context(
            format!("'{}' is not a valid number", raw.trim()),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string()),
        )
    })
}

fn parse_rounds(field: &str, rounds: usize) -> Result<usize> {
    if rounds == 0 {
        return Err(Error::configuration_with_context(
            "round limit must be at least 1",
            ErrorContext::new().with_field_path(field),
        ));
    }
    Ok(rounds)
}

/// Zero disables the timeout.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
