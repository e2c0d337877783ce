//! Per-query state threaded through the control loop.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::records::{GenerationOutput, QueryAnalysis, ReflectionResult};
use super::suggestion::EnrichmentSuggestion;

/// Element name → synthesized value, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedData {
    entries: Vec<(String, String)>,
}

impl EnrichedData {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value, replacing any previous value for the same element
    /// without changing its position.
    pub fn insert(&mut self, element: impl Into<String>, value: impl Into<String>) {
        let element = element.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == element) {
            entry.1 = value;
        } else {
            self.entries.push((element, value));
        }
    }

    /// Looks up the value for an element.
    #[must_use]
    pub fn get(&self, element: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == element)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(element, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over element names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for EnrichedData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

impl Serialize for EnrichedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Mutable record for one query, owned by the orchestrator for the duration
/// of [`Orchestrator::process_query`](crate::agent::Orchestrator::process_query).
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    /// The query as submitted.
    pub user_query: String,
    /// Set once by the analysis step.
    pub query_analysis: Option<QueryAnalysis>,
    /// Overwritten by every retrieval attempt.
    pub generation_output: Option<GenerationOutput>,
    /// Overwritten by every reflection pass.
    pub reflection_result: Option<ReflectionResult>,
    /// Clarification appended to the retrieval query once set.
    pub clarification_response: Option<String>,
    /// Data synthesized for missing elements.
    pub enriched_data: Option<EnrichedData>,
    /// Set exactly once, by the terminal step.
    pub final_answer: Option<String>,
    /// Computed by the terminal step.
    pub enrichment_suggestions: Option<Vec<EnrichmentSuggestion>>,
    /// One entry per node execution. Append-only.
    pub execution_trace: Vec<String>,
    /// Number of retrieval attempts so far.
    pub retry_count: u32,
}

impl AgentState {
    /// Creates fresh state for a query.
    #[must_use]
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            query_analysis: None,
            generation_output: None,
            reflection_result: None,
            clarification_response: None,
            enriched_data: None,
            final_answer: None,
            enrichment_suggestions: None,
            execution_trace: Vec::new(),
            retry_count: 0,
        }
    }

    /// The query sent to the answer engine: the user query, plus the
    /// clarification once one has been obtained.
    #[must_use]
    pub fn retrieval_query(&self) -> String {
        match &self.clarification_response {
            Some(clarification) => {
                format!("{} [Clarification: {clarification}]", self.user_query)
            }
            None => self.user_query.clone(),
        }
    }

    /// Appends a trace entry.
    pub fn record(&mut self, entry: impl Into<String>) {
        self.execution_trace.push(entry.into());
    }

    /// Source list of the latest generation, or empty.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        self.generation_output
            .as_ref()
            .map(|g| g.sources.as_slice())
            .unwrap_or_default()
    }
}
