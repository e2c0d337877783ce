//! The model-backed role abstraction.
//!
//! Query analysis, reflection, and answer generation are each an [`Agent`]:
//! a fixed system prompt and model settings run once per call against any
//! [`LlmProvider`].

use async_trait::async_trait;
use tracing::debug;

use super::message::{ChatRequest, ChatResponse};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// A single-shot model role.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Role name for logging.
    fn name(&self) -> &'static str;

    /// Model identifier.
    fn model(&self) -> &str;

    /// Role instructions.
    fn system_prompt(&self) -> &str;

    /// Whether to request a JSON object reply.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature. `None` leaves the provider default.
    fn temperature(&self) -> Option<f32> {
        None
    }

    /// Completion token cap.
    fn max_tokens(&self) -> u32 {
        1024
    }

    /// Builds the request for `user_msg` from the role's settings.
    fn request(&self, user_msg: &str) -> ChatRequest {
        let request = ChatRequest::new(self.model(), self.system_prompt(), user_msg)
            .with_max_tokens(self.max_tokens())
            .with_json_mode(self.json_mode());
        match self.temperature() {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }

    /// Runs the role once against `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or timeouts.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<ChatResponse, AgentError> {
        let response = provider.chat(&self.request(user_msg)).await?;
        debug!(
            agent = self.name(),
            model = self.model(),
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "agent call finished"
        );
        Ok(response)
    }
}
