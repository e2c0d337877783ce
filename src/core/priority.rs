//! Priority level for enrichment suggestions.

use serde::{Deserialize, Serialize};

/// Urgency of an enrichment suggestion, ordered from most to least urgent.
///
/// Discriminants are inverted (`High = 0`, `Low = 2`) so that the derived
/// [`Ord`] sorts the most urgent suggestions first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Act on this before trusting the answer.
    High = 0,
    /// Worth acting on.
    Medium = 1,
    /// Nice to have.
    Low = 2,
}

impl Priority {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
