//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ragent-rs: reflective retrieval-augmented question answering.
///
/// Answers questions from a directory of documents, critiquing each answer
/// and clarifying, enriching, or retrying before it settles.
#[derive(Parser, Debug)]
#[command(name = "ragent-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Which judge schema to apply to a raw reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JudgeKind {
    /// Query-analysis record.
    Analysis,
    /// Reflection record.
    Reflection,
}

impl JudgeKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Reflection => "reflection",
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question from a document directory.
    ///
    /// Runs analysis, retrieval, reflection, and any clarification,
    /// enrichment, or retry detours, then prints the final answer with
    /// enrichment suggestions. Requires an OpenAI-compatible API key.
    #[command(after_help = r#"Examples:
  ragent-rs query "How many leave days do I get?" --docs ./docs
  ragent-rs query "Q3 revenue by region" --docs ./docs --max-retries 2 --trace
  ragent-rs --format json query "Who approves leave?" --docs ./docs | jq .answer
  PERPLEXITY_API_KEY=pplx-... ragent-rs query "..." --docs ./docs
  ragent-rs query "..." --docs ./docs --provider openai --chat-model gpt-4o-mini
"#)]
    Query {
        /// The question to answer.
        query: String,

        /// Directory of .txt, .md, .json, and .csv documents.
        #[arg(short, long)]
        docs: PathBuf,

        /// LLM provider (perplexity, openai).
        #[arg(long)]
        provider: Option<String>,

        /// Base URL override for the provider API.
        #[arg(long)]
        base_url: Option<String>,

        /// Read the API key from this file (first line).
        #[arg(long)]
        api_key_file: Option<PathBuf>,

        /// Model for query analysis and answer generation.
        #[arg(long)]
        chat_model: Option<String>,

        /// Model for the reflection judge.
        #[arg(long)]
        reasoning_model: Option<String>,

        /// Retrieval attempts before completion is forced.
        #[arg(long)]
        max_retries: Option<u32>,

        /// Hard ceiling on control-loop node executions.
        #[arg(long)]
        max_steps: Option<usize>,

        /// Documents retrieved per attempt.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,

        /// Request JSON-formatted judge replies.
        #[arg(long)]
        json_mode: bool,

        /// Include the execution trace in text output.
        #[arg(long)]
        trace: bool,
    },

    /// List the documents loaded from a directory.
    #[command(after_help = r#"Examples:
  ragent-rs documents --docs ./docs
  ragent-rs --format json documents --docs ./docs | jq '.documents[].source'
"#)]
    Documents {
        /// Directory of .txt, .md, .json, and .csv documents.
        #[arg(short, long)]
        docs: PathBuf,
    },

    /// Sanitize and parse a raw judge reply.
    ///
    /// Strips reasoning blocks and code fences, parses the remaining JSON
    /// against the judge's schema, and reports whether the default record
    /// had to be substituted. Makes no network calls.
    #[command(after_help = r#"Examples:
  ragent-rs inspect-reply --judge reflection reply.txt
  pbpaste | ragent-rs inspect-reply --judge analysis
"#)]
    InspectReply {
        /// Judge schema to apply.
        #[arg(long, value_enum, default_value = "reflection")]
        judge: JudgeKind,

        /// File containing the raw reply (reads stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Write the default prompt templates for customization.
    ///
    /// Existing files are left untouched.
    InitPrompts {
        /// Target directory (defaults to ~/.config/ragent-rs/prompts).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
