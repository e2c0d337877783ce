//! Caller-facing projection of a finished [`AgentState`].

use serde::Serialize;

use super::state::AgentState;
use super::suggestion::EnrichmentSuggestion;

/// Answer text reported when the loop produced none.
const NO_ANSWER: &str = "No answer generated";

/// Final result of a query, shaped for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    /// The query as submitted.
    pub query: String,
    /// Final answer text.
    pub answer: String,
    /// Reflection confidence when reflection ran, else the engine confidence.
    pub confidence: f64,
    /// Missing elements reported by the last reflection.
    pub missing_info: Vec<String>,
    /// Sources backing the final generation.
    pub sources: Vec<String>,
    /// Whether the last reflection judged the answer complete.
    pub is_complete: bool,
    /// Suggestions for improving the knowledge base.
    pub enrichment_suggestions: Vec<EnrichmentSuggestion>,
    /// Whether the enrichment step ran.
    pub enrichment_triggered: bool,
    /// Whether the clarification step ran.
    pub clarification_triggered: bool,
    /// Number of retrieval attempts.
    pub retry_count: u32,
    /// Control-loop trace.
    pub execution_trace: Vec<String>,
}

impl QueryReport {
    /// Builds the report from a final state.
    #[must_use]
    pub fn from_state(state: &AgentState) -> Self {
        let engine_confidence = state.generation_output.as_ref().map_or(0.0, |g| g.confidence);
        let reflection = state.reflection_result.as_ref();

        Self {
            query: state.user_query.clone(),
            answer: state
                .final_answer
                .clone()
                .unwrap_or_else(|| NO_ANSWER.to_string()),
            confidence: reflection.map_or(engine_confidence, |r| r.confidence_score),
            missing_info: reflection.map(|r| r.missing_elements.clone()).unwrap_or_default(),
            sources: state.sources().to_vec(),
            is_complete: reflection.is_none_or(|r| r.is_complete),
            enrichment_suggestions: state.enrichment_suggestions.clone().unwrap_or_default(),
            enrichment_triggered: state.enriched_data.is_some(),
            clarification_triggered: state.clarification_response.is_some(),
            retry_count: state.retry_count,
            execution_trace: state.execution_trace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{GenerationOutput, ReflectionResult};

    #[test]
    fn test_report_without_reflection_uses_engine_confidence() {
        let mut state = AgentState::new("q");
        state.generation_output = Some(GenerationOutput::new(
            "a",
            vec!["hr_policy.md".to_string()],
            0.85,
        ));
        state.final_answer = Some("a".to_string());
        let report = QueryReport::from_state(&state);
        assert!((report.confidence - 0.85).abs() < f64::EPSILON);
        assert!(report.is_complete);
        assert!(report.missing_info.is_empty());
        assert_eq!(report.sources, vec!["hr_policy.md".to_string()]);
        assert!(!report.enrichment_triggered);
    }

    #[test]
    fn test_report_with_reflection() {
        let mut state = AgentState::new("q");
        state.generation_output = Some(GenerationOutput::new("a", Vec::new(), 0.3));
        state.reflection_result = Some(ReflectionResult {
            is_complete: false,
            missing_elements: vec!["Q3_Sales".to_string()],
            confidence_score: 0.4,
            ..ReflectionResult::default()
        });
        state.clarification_response = Some("latest".to_string());
        let report = QueryReport::from_state(&state);
        assert!((report.confidence - 0.4).abs() < f64::EPSILON);
        assert!(!report.is_complete);
        assert_eq!(report.missing_info, vec!["Q3_Sales".to_string()]);
        assert!(report.clarification_triggered);
        assert_eq!(report.answer, NO_ANSWER);
    }
}
