//! Enrichment suggestion synthesis.
//!
//! Turns the final reflection and generation output into short, ranked
//! hints for the user. Pure: no model calls, no state mutation.

use crate::core::{EnrichmentSuggestion, GenerationOutput, Priority, ReflectionResult, SuggestionKind};

/// Substrings marking a missing element as process metadata, not content.
const META_TERMS: [&str; 7] = [
    "confidence",
    "justification",
    "reliability",
    "confirmation",
    "verification_method",
    "score",
    "source_reliability",
];

/// Maximum `missing_data` suggestions emitted.
const MAX_MISSING_DATA: usize = 3;

/// Generation confidence below which missing elements become suggestions.
const MISSING_DATA_CONFIDENCE: f64 = 0.7;

/// Generation confidence below which an unsourced answer is flagged.
const NO_SOURCES_CONFIDENCE: f64 = 0.5;

/// Generation confidence below which a thinly sourced answer is flagged.
const LOW_CONFIDENCE: f64 = 0.4;

/// Builds the suggestions for a finished query.
///
/// Missing-data hints come first, followed by at most one of `no_sources`
/// or `low_confidence`. Empty unless both records are present.
#[must_use]
pub fn synthesize(
    reflection: Option<&ReflectionResult>,
    output: Option<&GenerationOutput>,
) -> Vec<EnrichmentSuggestion> {
    let (Some(reflection), Some(output)) = (reflection, output) else {
        return Vec::new();
    };

    let confidence = output.confidence;
    let mut suggestions = Vec::new();

    if !reflection.is_complete && confidence < MISSING_DATA_CONFIDENCE {
        suggestions.extend(
            reflection
                .missing_elements
                .iter()
                .filter(|element| is_substantive(element))
                .take(MAX_MISSING_DATA)
                .map(|element| {
                    let readable = humanize(element);
                    EnrichmentSuggestion {
                        kind: SuggestionKind::MissingData,
                        action: format!(
                            "Consider uploading documents with information about {readable}"
                        ),
                        element: readable,
                        priority: Priority::Medium,
                    }
                }),
        );
    }

    if output.sources.is_empty()
        && !has_inline_citation(&output.answer)
        && confidence < NO_SOURCES_CONFIDENCE
    {
        suggestions.push(EnrichmentSuggestion {
            kind: SuggestionKind::NoSources,
            element: "Source Documents".to_string(),
            action: "Upload relevant documents to improve answer quality".to_string(),
            priority: Priority::High,
        });
    } else if confidence < LOW_CONFIDENCE && output.sources.len() < 2 {
        suggestions.push(EnrichmentSuggestion {
            kind: SuggestionKind::LowConfidence,
            element: "Additional Context".to_string(),
            action: "Consider uploading more detailed documents for better accuracy".to_string(),
            priority: Priority::Medium,
        });
    }

    suggestions
}

fn is_substantive(element: &str) -> bool {
    let lower = element.to_lowercase();
    !META_TERMS.iter().any(|term| lower.contains(term))
}

/// `[Source:` anywhere in the answer, in any letter case.
fn has_inline_citation(answer: &str) -> bool {
    answer.contains("[Source:") || answer.to_lowercase().contains("[source:")
}

/// Underscores become spaces and each word is title-cased: a letter is
/// upper-cased when it does not follow another letter.
fn humanize(element: &str) -> String {
    let mut out = String::with_capacity(element.len());
    let mut after_letter = false;
    for c in element.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}
