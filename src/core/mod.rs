//! Domain records for the reflective query loop.
//!
//! These types live outside [`crate::agent`] so the CLI and any other
//! caller can read a finished [`AgentState`] without touching the loop.

pub mod priority;
pub mod records;
pub mod report;
pub mod state;
pub mod suggestion;

pub use priority::Priority;
pub use records::{
    GenerationOutput, QueryAnalysis, QueryIntent, ReflectionResult, clamp_unit,
    dedup_preserving_order,
};
pub use report::QueryReport;
pub use state::{AgentState, EnrichedData};
pub use suggestion::{EnrichmentSuggestion, SuggestionKind};
