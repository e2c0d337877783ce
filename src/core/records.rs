//! Structured records exchanged with the loop's collaborators.
//!
//! Every collaborator reply is normalized into one of these types as soon as
//! it crosses the boundary, so the control loop never inspects raw JSON.

use serde::{Deserialize, Serialize};

/// Confidence substituted when the analysis judge reply is unusable.
pub const DEFAULT_ANALYSIS_CONFIDENCE: f64 = 0.5;

/// Confidence substituted when the reflection judge reply is unusable.
pub const DEFAULT_REFLECTION_CONFIDENCE: f64 = 0.7;

/// Classified intent of a user query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Look up a specific fact.
    #[default]
    FactualLookup,
    /// Compare, reason about, or explain information.
    Analytical,
    /// Describe how to do something.
    Procedural,
    /// The intent could not be pinned down. Unrecognised labels land here too.
    #[serde(other)]
    Ambiguous,
}

impl QueryIntent {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FactualLookup => "factual_lookup",
            Self::Analytical => "analytical",
            Self::Procedural => "procedural",
            Self::Ambiguous => "ambiguous",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the query-analysis judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Primary intent.
    #[serde(default)]
    pub intent: QueryIntent,
    /// Sub-questions a complete answer must cover.
    #[serde(default)]
    pub sub_questions: Vec<String>,
    /// Data elements a complete answer requires.
    #[serde(default)]
    pub required_data_elements: Vec<String>,
    /// Judge's confidence that it understood the query, in `[0, 1]`.
    #[serde(default = "default_analysis_confidence")]
    pub confidence: f64,
    /// Whether external (web) augmentation might help.
    #[serde(default)]
    pub needs_web_search: bool,
    /// The query this analysis was produced for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

const fn default_analysis_confidence() -> f64 {
    DEFAULT_ANALYSIS_CONFIDENCE
}

impl Default for QueryAnalysis {
    fn default() -> Self {
        Self {
            intent: QueryIntent::FactualLookup,
            sub_questions: Vec::new(),
            required_data_elements: Vec::new(),
            confidence: DEFAULT_ANALYSIS_CONFIDENCE,
            needs_web_search: false,
            original_query: None,
        }
    }
}

impl QueryAnalysis {
    /// Clamps the confidence and drops blank list entries.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_unit(self.confidence);
        drop_blank(&mut self.sub_questions);
        drop_blank(&mut self.required_data_elements);
        self
    }
}

/// Output of one retrieval-and-generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Generated answer text.
    pub answer: String,
    /// Source names backing the answer, deduplicated in first-seen order.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f64,
    /// Wall-clock time spent retrieving and generating.
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl GenerationOutput {
    /// Creates a normalized output: sources deduplicated, confidence clamped.
    #[must_use]
    pub fn new(answer: impl Into<String>, sources: Vec<String>, confidence: f64) -> Self {
        Self {
            answer: answer.into(),
            sources: dedup_preserving_order(sources),
            confidence: clamp_unit(confidence),
            execution_time_ms: 0,
        }
    }

    /// Sets the execution time.
    #[must_use]
    pub const fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    /// Re-applies normalization to an output built elsewhere.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.sources = dedup_preserving_order(std::mem::take(&mut self.sources));
        self.confidence = clamp_unit(self.confidence);
        self
    }
}

/// Output of the reflection judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionResult {
    /// Whether the answer addresses the question.
    #[serde(default = "default_true")]
    pub is_complete: bool,
    /// Substantive gaps the judge identified.
    #[serde(default)]
    pub missing_elements: Vec<String>,
    /// Whether the question is too ambiguous to answer as asked.
    #[serde(default)]
    pub ambiguity_detected: bool,
    /// Question to put back to the user when ambiguous.
    #[serde(default)]
    pub clarifying_question: Option<String>,
    /// Judge's confidence in the answer, in `[0, 1]`.
    #[serde(default = "default_reflection_confidence")]
    pub confidence_score: f64,
    /// Whether external (web) augmentation might help.
    #[serde(default)]
    pub needs_web_search: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_reflection_confidence() -> f64 {
    DEFAULT_REFLECTION_CONFIDENCE
}

impl Default for ReflectionResult {
    fn default() -> Self {
        Self {
            is_complete: true,
            missing_elements: Vec::new(),
            ambiguity_detected: false,
            clarifying_question: None,
            confidence_score: DEFAULT_REFLECTION_CONFIDENCE,
            needs_web_search: false,
        }
    }
}

impl ReflectionResult {
    /// Clamps the confidence, drops blank elements, and treats an empty or
    /// literal `"null"` clarifying question as absent.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.confidence_score = clamp_unit(self.confidence_score);
        drop_blank(&mut self.missing_elements);
        self.clarifying_question = self.clarifying_question.filter(|q| {
            let q = q.trim();
            !q.is_empty() && !q.eq_ignore_ascii_case("null")
        });
        self
    }
}

/// Clamps a score into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Removes duplicates while keeping the first occurrence of each item.
#[must_use]
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn drop_blank(items: &mut Vec<String>) {
    items.retain(|s| !s.trim().is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_defaults_from_partial_json() {
        let analysis: QueryAnalysis =
            serde_json::from_str(r#"{"intent": "procedural"}"#).unwrap_or_else(|_| unreachable!());
        assert_eq!(analysis.intent, QueryIntent::Procedural);
        assert!(analysis.sub_questions.is_empty());
        assert!((analysis.confidence - DEFAULT_ANALYSIS_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_intent_is_ambiguous() {
        let analysis: QueryAnalysis = serde_json::from_str(r#"{"intent": "comparison"}"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(analysis.intent, QueryIntent::Ambiguous);
    }

    #[test]
    fn test_reflection_defaults() {
        let reflection = ReflectionResult::default();
        assert!(reflection.is_complete);
        assert!(!reflection.ambiguity_detected);
        assert!(reflection.clarifying_question.is_none());
        assert!((reflection.confidence_score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reflection_normalizes_null_question() {
        let reflection = ReflectionResult {
            clarifying_question: Some("null".to_string()),
            confidence_score: 1.4,
            missing_elements: vec![String::new(), "Q3_Sales".to_string()],
            ..ReflectionResult::default()
        }
        .normalized();
        assert!(reflection.clarifying_question.is_none());
        assert!((reflection.confidence_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(reflection.missing_elements, vec!["Q3_Sales".to_string()]);
    }

    #[test]
    fn test_generation_output_dedups_sources() {
        let output = GenerationOutput::new(
            "answer",
            vec![
                "b.md".to_string(),
                "a.md".to_string(),
                "b.md".to_string(),
            ],
            -0.2,
        );
        assert_eq!(output.sources, vec!["b.md".to_string(), "a.md".to_string()]);
        assert!(output.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_unit_nan() {
        assert!(clamp_unit(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_unit(0.42) - 0.42).abs() < f64::EPSILON);
    }
}
