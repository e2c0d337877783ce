//! Reflective retrieval-augmented query loop.
//!
//! Answers a query by retrieving, critiquing its own answer, and taking a
//! bounded number of corrective detours before finalizing. Model calls go
//! through a pluggable provider backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── QueryAnalysisAgent (intent, sub-questions, required data)
//!   ├── AnswerEngine (retrieve + generate + score)
//!   ├── ReflectionAgent (complete? ambiguous? what is missing?)
//!   │   └── router → finalize | clarify | enrich | retry
//!   └── finalize → answer + enrichment suggestions
//! ```

pub mod analyzer;
pub mod augment;
pub mod client;
pub mod config;
pub mod engine;
pub mod judge;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod reflector;
pub mod sanitize;
pub mod suggestions;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use analyzer::QueryAnalysisAgent;
pub use augment::{Clarifier, Enricher, PlaceholderClarifier, PlaceholderEnricher};
pub use client::create_provider;
pub use config::AgentConfig;
pub use engine::{AnswerEngine, RagEngine, RetrievedDocument, Retriever, score_confidence};
pub use judge::{Judged, Verdict};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{Node, Orchestrator, Route};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use reflector::ReflectionAgent;
pub use sanitize::{extract_json_payload, parse_judge_reply};
pub use suggestions::synthesize;
pub use traits::Agent;
