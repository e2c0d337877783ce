//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AgentError;

/// Default provider name.
const DEFAULT_PROVIDER: &str = "perplexity";
/// Default model for query analysis and answer generation.
const DEFAULT_CHAT_MODEL: &str = "sonar-pro";
/// Default model for the reflection judge.
const DEFAULT_REASONING_MODEL: &str = "sonar-reasoning-pro";
/// Default judge max tokens.
const DEFAULT_JUDGE_MAX_TOKENS: u32 = 1024;
/// Default answer generation max tokens.
const DEFAULT_GENERATION_MAX_TOKENS: u32 = 1000;
/// Default answer generation temperature.
const DEFAULT_GENERATION_TEMPERATURE: f32 = 0.1;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default number of retrieval attempts before completion is forced.
pub const DEFAULT_MAX_RETRIES: u32 = 1;
/// Default ceiling on node executions per query.
pub const DEFAULT_MAX_STEPS: usize = 32;
/// Default number of documents retrieved per attempt.
const DEFAULT_TOP_K: usize = 10;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (`"perplexity"` or `"openai"`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model for query analysis and answer generation.
    pub chat_model: String,
    /// Model for the reflection judge.
    pub reasoning_model: String,
    /// Maximum tokens for judge replies.
    pub judge_max_tokens: u32,
    /// Maximum tokens for generated answers.
    pub generation_max_tokens: u32,
    /// Sampling temperature for generated answers.
    pub generation_temperature: f32,
    /// Request `response_format = json_object` from judges. Off by default
    /// because not every OpenAI-compatible backend accepts it.
    pub json_mode: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retrieval attempts after which the router forces completion.
    ///
    /// At the default of 1 the router's ambiguity, enrichment, and retry
    /// branches never fire; raise it to make them reachable.
    pub max_retries: u32,
    /// Hard ceiling on node executions per query.
    pub max_steps: usize,
    /// Documents retrieved per attempt.
    pub top_k: usize,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    chat_model: Option<String>,
    reasoning_model: Option<String>,
    judge_max_tokens: Option<u32>,
    generation_max_tokens: Option<u32>,
    generation_temperature: Option<f32>,
    json_mode: Option<bool>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    max_steps: Option<usize>,
    top_k: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    ///
    /// Key and base URL come from the selected provider's variables
    /// (`PERPLEXITY_*` or `OPENAI_*`) before the generic `RAGENT_*` ones.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.fill_from(|name| std::env::var(name).ok())
    }

    /// Populates unset fields through `lookup`, which maps a variable name
    /// to its value.
    fn fill_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.provider.is_none() {
            self.provider = lookup("RAGENT_PROVIDER");
        }
        let prefix = provider_env_prefix(self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER));

        if self.api_key.is_none() {
            self.api_key = prefix
                .and_then(|p| lookup(&format!("{p}_API_KEY")))
                .or_else(|| lookup("RAGENT_API_KEY"))
                .or_else(|| {
                    lookup("RAGENT_API_KEY_FILE").and_then(|path| read_key_file(Path::new(&path)))
                });
        }
        if self.base_url.is_none() {
            self.base_url = prefix
                .and_then(|p| lookup(&format!("{p}_BASE_URL")))
                .or_else(|| lookup("RAGENT_BASE_URL"));
        }
        if self.chat_model.is_none() {
            self.chat_model = lookup("RAGENT_CHAT_MODEL");
        }
        if self.reasoning_model.is_none() {
            self.reasoning_model = lookup("RAGENT_REASONING_MODEL");
        }
        if self.max_retries.is_none() {
            self.max_retries = lookup("RAGENT_MAX_RETRIES").and_then(|v| v.parse().ok());
        }
        if self.top_k.is_none() {
            self.top_k = lookup("RAGENT_TOP_K").and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = lookup("RAGENT_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Reads the API key from a file (first line, trimmed). An unreadable
    /// or empty file leaves the key unset.
    #[must_use]
    pub fn api_key_file(mut self, path: impl AsRef<Path>) -> Self {
        if let Some(key) = read_key_file(path.as_ref()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the chat (analysis and generation) model.
    #[must_use]
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Sets the reasoning (reflection) model.
    #[must_use]
    pub fn reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning_model = Some(model.into());
        self
    }

    /// Sets the judge max tokens.
    #[must_use]
    pub const fn judge_max_tokens(mut self, n: u32) -> Self {
        self.judge_max_tokens = Some(n);
        self
    }

    /// Sets the generation max tokens.
    #[must_use]
    pub const fn generation_max_tokens(mut self, n: u32) -> Self {
        self.generation_max_tokens = Some(n);
        self
    }

    /// Sets the generation temperature.
    #[must_use]
    pub const fn generation_temperature(mut self, t: f32) -> Self {
        self.generation_temperature = Some(t);
        self
    }

    /// Enables or disables JSON response format for judges.
    #[must_use]
    pub const fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = Some(enabled);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the retrieval attempt limit.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the node execution ceiling.
    #[must_use]
    pub const fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Sets the number of documents retrieved per attempt.
    #[must_use]
    pub const fn top_k(mut self, n: usize) -> Self {
        self.top_k = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self.base_url,
            chat_model: self
                .chat_model
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            reasoning_model: self
                .reasoning_model
                .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_string()),
            judge_max_tokens: self.judge_max_tokens.unwrap_or(DEFAULT_JUDGE_MAX_TOKENS),
            generation_max_tokens: self
                .generation_max_tokens
                .unwrap_or(DEFAULT_GENERATION_MAX_TOKENS),
            generation_temperature: self
                .generation_temperature
                .unwrap_or(DEFAULT_GENERATION_TEMPERATURE),
            json_mode: self.json_mode.unwrap_or(false),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            max_steps: self.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            prompt_dir: self.prompt_dir,
        })
    }
}

/// Environment prefix for a provider's own key and endpoint variables.
fn provider_env_prefix(provider: &str) -> Option<&'static str> {
    match provider.trim().to_lowercase().as_str() {
        "perplexity" => Some("PERPLEXITY"),
        "openai" => Some("OPENAI"),
        _ => None,
    }
}

fn read_key_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.lines().next().map(|l| l.trim().to_string()))
        .filter(|key| !key.is_empty())
}
