use std::time::Duration;

use url::Url;

use crate::client::core::ChatClient;
use crate::drivers::OpenAiDriver;
use crate::transport::{HttpOptions, HttpTransport};
use crate::{Error, ErrorContext, Result};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Builder for creating chat clients with custom configuration.
#[derive(Debug, Clone)]
pub struct ChatClientBuilder {
    provider_id: String,
    base_url: String,
    model_id: String,
    api_key: Option<String>,
    connect_timeout: Option<Duration>,
    proxy: Option<String>,
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self {
            provider_id: "groq".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL.to_string(),
            api_key: None,
            connect_timeout: HttpOptions::default().connect_timeout,
            proxy: None,
        }
    }

    /// Provider label used in logs.
    pub fn provider_id(mut self, id: impl Into<String>) -> Self {
        self.provider_id = id.into();
        self
    }

    /// Override base URL (also used to point tests at a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Bound on establishing a connection; `None` disables it.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Route every request through this proxy.
    pub fn proxy(mut self, url: Option<String>) -> Self {
        self.proxy = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid model API base URL '{}'", self.base_url),
                ErrorContext::new()
                    .with_field_path("GROQ_BASE_URL")
                    .with_details(e.to_string()),
            )
        })?;
        let proxy = match &self.proxy {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL '{}'", raw.trim()),
                    ErrorContext::new()
                        .with_field_path("AGENT_PROXY_URL")
                        .with_details(e.to_string()),
                )
            })?),
            None => None,
        };
        let options = HttpOptions {
            connect_timeout: self.connect_timeout,
            proxy,
        };
        if self.model_id.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model identifier is empty",
                ErrorContext::new().with_field_path("GROQ_MODEL"),
            ));
        }
        if self.api_key.is_none() {
            tracing::warn!(provider = %self.provider_id, "no API key configured, requests will be unauthenticated");
        }

        Ok(ChatClient {
            driver: Box::new(OpenAiDriver::new(self.provider_id)),
            transport: HttpTransport::new(base_url, self.api_key, &options)?,
            model_id: self.model_id,
        })
    }
}
