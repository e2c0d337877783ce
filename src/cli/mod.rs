//! CLI layer for ragent-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! answering questions, listing documents, and inspecting judge replies.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, JudgeKind};
