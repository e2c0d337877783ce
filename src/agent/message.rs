//! Provider-agnostic chat types.
//!
//! Every model call in the loop is single-shot: one system prompt, one user
//! message, one reply. Providers translate these into their SDK's types.

use serde::{Deserialize, Serialize};

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Role instructions for the judge or answer generator.
    System,
    /// The rendered prompt.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "sonar-pro").
    pub model: String,
    /// System prompt followed by the user prompt.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Ask for a JSON object reply.
    pub json_mode: bool,
}

impl ChatRequest {
    /// Single-turn request: `system` instructions plus one `user` prompt.
    #[must_use]
    pub fn new(model: impl Into<String>, system: &str, user: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: None,
            json_mode: false,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Caps the completion length.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Requests a JSON object reply when `enabled`.
    #[must_use]
    pub const fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Completion tokens.
    pub completion_tokens: u32,
    /// Prompt plus completion.
    pub total_tokens: u32,
}

/// A chat completion reply.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Reply text; empty when the model returned nothing.
    pub content: String,
    /// Token accounting.
    pub usage: TokenUsage,
    /// Lowercased finish reason (`"stop"`, `"length"`, ...).
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// `true` when the model stopped at the token cap. A truncated judge
    /// reply usually fails to parse.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}
