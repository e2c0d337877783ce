//! # ragent-rs
//!
//! Reflective retrieval-augmented question answering.
//!
//! A query goes through a bounded control loop: an LLM judge analyzes it,
//! an answer engine retrieves documents and drafts a grounded answer, a
//! second judge critiques the draft, and the loop then finalizes, asks for
//! clarification, fetches missing data, or retries retrieval. Every node
//! appends one line to an execution trace, and the loop is guaranteed to
//! terminate.
//!
//! ## Layout
//!
//! - [`core`]: records passed between nodes (analysis, output, reflection,
//!   state, suggestions, report)
//! - [`agent`]: judges, answer engine, providers, and the orchestrator
//! - [`corpus`]: in-memory document corpus used as the default retriever
//! - [`cli`]: command-line interface
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ragent::agent::{AgentConfig, Orchestrator, PromptSet, RagEngine, create_provider};
//! use ragent::corpus::DocumentCorpus;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let corpus = DocumentCorpus::load(std::path::Path::new("./docs"))?;
//! let provider = create_provider(&config)?;
//! let prompts = PromptSet::defaults();
//! let engine = Arc::new(RagEngine::new(
//!     &config,
//!     prompts.answer.clone(),
//!     Arc::new(corpus),
//!     Arc::clone(&provider),
//! ));
//!
//! let orchestrator = Orchestrator::with_prompts(provider, engine, &config, &prompts);
//! let state = orchestrator.process_query("How many days of annual leave do I get?").await?;
//! println!("{}", state.final_answer.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod corpus;
pub mod error;

pub use crate::core::{AgentState, EnrichmentSuggestion, QueryReport};
pub use agent::{AnswerEngine, Orchestrator};
pub use error::{AgentError, Error, Result};
