//! Provider factory.
//!
//! Resolves the configured provider name to a concrete [`LlmProvider`]. The
//! provider is built once per process and shared by the judges and the
//! answer engine.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Creates the shared provider named by [`AgentConfig::provider`].
///
/// Names are matched case-insensitively:
///
/// - `perplexity` (default): Perplexity's `OpenAI`-compatible API
/// - `openai`: `OpenAI`, or any compatible API via `base_url`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for any other name.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "perplexity" => Ok(Arc::new(OpenAiProvider::perplexity(config))),
        "openai" => Ok(Arc::new(OpenAiProvider::openai(config))),
        _ => Err(AgentError::UnsupportedProvider {
            name: config.provider.clone(),
        }),
    }
}
