//! Output rendering for CLI commands.
//!
//! Every command renders to a `String` in either human-readable text or
//! pretty JSON; the binary writes it to stdout.

use std::fmt::Write;

use serde::Serialize;

use crate::core::QueryReport;
use crate::corpus::DocumentCorpus;
use crate::error::{CommandError, Result};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::OutputFormat`] if serialization fails.
    pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| CommandError::OutputFormat(format!("JSON serialization failed: {e}")).into())
    }
}

/// Renders a finished query.
///
/// Text output is the answer, then suggestions, then a one-line footer;
/// `show_trace` appends the execution trace.
///
/// # Errors
///
/// Returns [`CommandError::OutputFormat`] if JSON serialization fails.
pub fn format_report(report: &QueryReport, format: OutputFormat, show_trace: bool) -> Result<String> {
    if format == OutputFormat::Json {
        return OutputFormat::to_json(report);
    }

    let mut out = report.answer.clone();
    out.push('\n');

    if !report.enrichment_suggestions.is_empty() {
        out.push_str("\nSuggestions:\n");
        for s in &report.enrichment_suggestions {
            let _ = writeln!(out, "  [{}] {}: {}", s.priority, s.element, s.action);
        }
    }

    let sources = if report.sources.is_empty() {
        "none".to_string()
    } else {
        report.sources.join(", ")
    };
    let _ = write!(
        out,
        "\n---\nConfidence: {:.2} | Complete: {} | Attempts: {} | Sources: {sources}",
        report.confidence, report.is_complete, report.retry_count
    );
    if report.clarification_triggered {
        out.push_str(" | Clarified");
    }
    if report.enrichment_triggered {
        out.push_str(" | Enriched");
    }
    out.push('\n');

    if show_trace {
        out.push_str("\nTrace:\n");
        for (i, entry) in report.execution_trace.iter().enumerate() {
            let _ = writeln!(out, "  {}. {entry}", i + 1);
        }
    }

    Ok(out)
}

/// Renders the document listing of a corpus.
///
/// # Errors
///
/// Returns [`CommandError::OutputFormat`] if JSON serialization fails.
pub fn format_documents(corpus: &DocumentCorpus, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return OutputFormat::to_json(&serde_json::json!({
            "root": corpus.root().to_string_lossy(),
            "count": corpus.len(),
            "documents": corpus.documents(),
        }));
    }

    let width = corpus
        .documents()
        .iter()
        .map(|d| d.source.len())
        .max()
        .unwrap_or(0)
        .max("SOURCE".len());

    let mut out = format!(
        "{} document(s) in {}\n\n{:<width$}  {:<8}  {:>10}\n",
        corpus.len(),
        corpus.root().display(),
        "SOURCE",
        "TYPE",
        "BYTES"
    );
    for doc in corpus.documents() {
        let _ = writeln!(out, "{:<width$}  {:<8}  {:>10}", doc.source, doc.kind.as_str(), doc.size);
    }
    Ok(out)
}

/// Renders a sanitized judge reply.
///
/// # Errors
///
/// Returns [`CommandError::OutputFormat`] if serialization fails.
pub fn format_judged<T: Serialize>(
    judge: &str,
    payload: &str,
    value: &T,
    fell_back: bool,
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        return OutputFormat::to_json(&serde_json::json!({
            "judge": judge,
            "fell_back": fell_back,
            "payload": payload,
            "record": value,
        }));
    }

    let record = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::OutputFormat(format!("JSON serialization failed: {e}")))?;
    let status = if fell_back {
        "unparseable, default record substituted"
    } else {
        "parsed"
    };
    Ok(format!(
        "Judge: {judge}\nStatus: {status}\n\nExtracted payload:\n{payload}\n\nRecord:\n{record}\n"
    ))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::core::{AgentState, EnrichmentSuggestion, GenerationOutput, Priority, SuggestionKind};

    fn report() -> QueryReport {
        let mut state = AgentState::new("How much leave?");
        state.retry_count = 1;
        state.generation_output = Some(GenerationOutput::new(
            "25 days [Source: hr_policy.md]",
            vec!["hr_policy.md".to_string()],
            0.85,
        ));
        state.final_answer = Some("25 days [Source: hr_policy.md]".to_string());
        state.enrichment_suggestions = Some(vec![EnrichmentSuggestion {
            kind: SuggestionKind::LowConfidence,
            element: "Additional Context".to_string(),
            action: "Consider uploading more detailed documents for better accuracy".to_string(),
            priority: Priority::Medium,
        }]);
        state.execution_trace = vec!["analyze_query: intent=factual_lookup".to_string()];
        QueryReport::from_state(&state)
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_format_report_text() {
        let out = format_report(&report(), OutputFormat::Text, true)
            .unwrap_or_else(|e| panic!("format failed: {e}"));
        assert!(out.starts_with("25 days [Source: hr_policy.md]\n"));
        assert!(out.contains("[medium] Additional Context: Consider uploading"));
        assert!(out.contains("Confidence: 0.85 | Complete: true | Attempts: 1 | Sources: hr_policy.md"));
        assert!(out.contains("  1. analyze_query: intent=factual_lookup"));
    }

    #[test]
    fn test_format_report_json() {
        let out = format_report(&report(), OutputFormat::Json, false)
            .unwrap_or_else(|e| panic!("format failed: {e}"));
        let value: serde_json::Value =
            serde_json::from_str(&out).unwrap_or_else(|e| panic!("invalid json: {e}"));
        assert_eq!(value["query"], "How much leave?");
        assert_eq!(value["retry_count"], 1);
        assert_eq!(value["enrichment_suggestions"][0]["type"], "low_confidence");
    }

    #[test]
    fn test_format_judged_text() {
        let out = format_judged(
            "reflection",
            "{}",
            &crate::core::ReflectionResult::default(),
            true,
            OutputFormat::Text,
        )
        .unwrap_or_else(|e| panic!("format failed: {e}"));
        assert!(out.contains("Status: unparseable, default record substituted"));
        assert!(out.contains("\"confidence_score\": 0.7"));
    }
}
