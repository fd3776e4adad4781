use async_trait::async_trait;
use tracing::{debug, info};

use super::{AssistantTurn, ChatModel};
use crate::drivers::{CompletionRequest, ProviderDriver};
use crate::transport::HttpTransport;
use crate::Result;

/// Chat completion client for an OpenAI-compatible HTTP API.
pub struct ChatClient {
    pub(crate) driver: Box<dyn ProviderDriver>,
    pub(crate) transport: HttpTransport,
    pub(crate) model_id: String,
}

impl ChatClient {
    pub fn provider_id(&self) -> &str {
        self.driver.provider_id()
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("provider", &self.driver.provider_id())
            .field("base_url", &self.transport.base_url().as_str())
            .field("model_id", &self.model_id)
            .finish()
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<AssistantTurn> {
        let outgoing = self.driver.build_request(request)?;
        debug!(
            provider = self.driver.provider_id(),
            model = request.model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "requesting chat completion"
        );

        let body = self.transport.post_json(&outgoing.path, &outgoing.body).await?;
        let response = self.driver.parse_response(&body)?;

        if let Some(usage) = &response.usage {
            info!(
                model = request.model_id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }

        Ok(AssistantTurn {
            text: response.content.unwrap_or_default(),
            tool_requests: response.tool_requests,
            finish_reason: response.finish_reason,
            usage: response.usage,
        })
    }
}
