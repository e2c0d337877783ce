//! `OpenAI`-compatible provider implementation using the `async-openai` crate.
//!
//! Serves both the `perplexity` provider (Perplexity's chat API is
//! `OpenAI`-compatible) and plain `openai`, differing only in the default
//! base URL.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, ResponseFormat,
};
use async_trait::async_trait;
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Perplexity API base URL.
pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

/// `OpenAI`-compatible LLM provider.
///
/// Wraps the `async-openai` client for chat completions and bounds every
/// request by the configured timeout.
pub struct OpenAiProvider {
    name: &'static str,
    client: Client<OpenAIConfig>,
    timeout: std::time::Duration,
}

impl OpenAiProvider {
    /// Creates a provider talking to the `OpenAI` API (or `base_url` if set).
    #[must_use]
    pub fn openai(config: &AgentConfig) -> Self {
        Self::with_default_base(config, "openai", None)
    }

    /// Creates a provider talking to Perplexity (or `base_url` if set).
    #[must_use]
    pub fn perplexity(config: &AgentConfig) -> Self {
        Self::with_default_base(config, "perplexity", Some(PERPLEXITY_BASE_URL))
    }

    fn with_default_base(
        config: &AgentConfig,
        name: &'static str,
        default_base: Option<&str>,
    ) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = config.base_url.as_deref().or(default_base) {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            name,
            client: Client::with_config(openai_config),
            timeout: config.timeout,
        }
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        let messages: Vec<_> = request.messages.iter().map(Self::convert_message).collect();

        let response_format = if request.json_mode {
            Some(ResponseFormat::JsonObject)
        } else {
            None
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature.filter(|&t| t != 0.0),
            max_completion_tokens: request.max_tokens,
            response_format,
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("client", &"<async-openai::Client>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = Self::build_request(request);
        debug!(provider = self.name, model = %request.model, "sending chat completion");

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(openai_request))
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| AgentError::ApiRequest {
                message: e.to_string(),
            })?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            content,
            usage,
            finish_reason,
        })
    }
}
