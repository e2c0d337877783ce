//! User-facing enrichment suggestions.

use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// What kind of gap a suggestion addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A substantive data element is missing from the knowledge base.
    MissingData,
    /// The answer is not backed by any source.
    NoSources,
    /// The answer is weakly supported.
    LowConfidence,
}

impl SuggestionKind {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingData => "missing_data",
            Self::NoSources => "no_sources",
            Self::LowConfidence => "low_confidence",
        }
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An actionable hint telling the user how to improve future answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSuggestion {
    /// Gap category.
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Human-readable name of what is missing.
    pub element: String,
    /// What the user should do about it.
    pub action: String,
    /// How urgent the suggestion is.
    pub priority: Priority,
}
