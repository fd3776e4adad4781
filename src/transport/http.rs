use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use reqwest::Proxy;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOptions {
    /// `None` leaves connects unbounded.
    pub connect_timeout: Option<Duration>,
    pub proxy: Option<Url>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            proxy: None,
        }
    }
}

/// JSON-over-HTTP transport for the chat-completion API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: Url, api_key: Option<String>, options: &HttpOptions) -> Result<Self> {
        // Connection-level limits only; per-call deadlines are enforced by the driver.
        let mut builder = reqwest::Client::builder().pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        if let Some(proxy_url) = &options.proxy {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                Error::configuration_with_context(
                    format!("unusable proxy URL '{}'", proxy_url),
                    ErrorContext::new()
                        .with_field_path("AGENT_PROXY_URL")
                        .with_details(e.to_string()),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Look up an API key stored in the OS keyring.
    pub fn keyring_api_key(service: &str, user: &str) -> Option<String> {
        let entry = Entry::new(service, user).ok()?;
        entry.get_password().ok()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POST a JSON body and decode the JSON reply.
    ///
    /// Non-2xx statuses become [`Error::Remote`] carrying the provider's
    /// `error.message` when the body has one, the raw body otherwise.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).json(body);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %text, "chat API returned an error status");
            return Err(Error::Remote {
                status: status.as_u16(),
                message: remote_error_message(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_dropping_path_segments() {
        let base = Url::parse("https://api.groq.com/openai/v1").unwrap();
        let transport = HttpTransport::new(base, None, &HttpOptions::default()).unwrap();
        assert_eq!(
            transport.endpoint("/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );

        let base = Url::parse("http://localhost:4010/").unwrap();
        let transport = HttpTransport::new(base, None, &HttpOptions::default()).unwrap();
        assert_eq!(
            transport.endpoint("chat/completions"),
            "http://localhost:4010/chat/completions"
        );
    }

    #[test]
    fn test_options_configure_the_client() {
        let base = Url::parse("https://api.groq.com/openai/v1").unwrap();
        let options = HttpOptions {
            connect_timeout: None,
            proxy: Some(Url::parse("http://proxy.internal:3128").unwrap()),
        };
        assert!(HttpTransport::new(base, Some("gsk_test".into()), &options).is_ok());
    }

    #[test]
    fn test_remote_error_message_prefers_provider_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(remote_error_message(body), "Invalid API Key");
        assert_eq!(remote_error_message("  bad gateway \n"), "bad gateway");
    }
}
