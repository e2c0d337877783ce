//! Clarification and enrichment hooks.
//!
//! The loop asks a [`Clarifier`] when the reflection judge flags ambiguity
//! and an [`Enricher`] when it reports missing elements. The placeholder
//! implementations answer immediately with fixed text; swap in a human
//! prompt or an external lookup to make them real.

use async_trait::async_trait;

use crate::error::AgentError;

/// Question used when the judge flagged ambiguity without asking one.
pub const DEFAULT_CLARIFYING_QUESTION: &str = "Could you please provide more details?";

/// Reply given by [`PlaceholderClarifier`].
pub const PLACEHOLDER_CLARIFICATION: &str = "Please provide the most recent available data";

/// Supplies a clarification for an ambiguous query.
#[async_trait]
pub trait Clarifier: Send + Sync {
    /// Answers `question` about `query`.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] if no clarification can be obtained.
    async fn clarify(&self, query: &str, question: &str) -> Result<String, AgentError>;
}

/// Fetches a value for a missing data element.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Returns a value for `element`.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] if the lookup fails.
    async fn enrich(&self, element: &str) -> Result<String, AgentError>;
}

/// Clarifier that always answers [`PLACEHOLDER_CLARIFICATION`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderClarifier;

#[async_trait]
impl Clarifier for PlaceholderClarifier {
    async fn clarify(&self, _query: &str, _question: &str) -> Result<String, AgentError> {
        Ok(PLACEHOLDER_CLARIFICATION.to_string())
    }
}

/// Enricher that fabricates a labelled stand-in value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEnricher;

#[async_trait]
impl Enricher for PlaceholderEnricher {
    async fn enrich(&self, element: &str) -> Result<String, AgentError> {
        Ok(format!("Simulated data for {element} from external system"))
    }
}
