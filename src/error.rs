//! Error types for ragent-rs.
//!
//! Each layer has its own error enum; [`Error`] aggregates them so the CLI
//! can propagate everything with `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent, provider, or control-loop failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Document corpus failure.
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure outside the corpus loader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent system and its collaborators.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured.
    #[error(
        "API key missing: set PERPLEXITY_API_KEY, OPENAI_API_KEY or RAGENT_API_KEY, \
         or pass --api-key-file"
    )]
    ApiKeyMissing,

    /// The configured provider name is unknown.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The provider API returned an error.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description.
        message: String,
    },

    /// A provider request exceeded the configured timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// The retrieval-and-generation engine failed; fatal for the current query.
    #[error("retrieval failed: {message}")]
    Retrieval {
        /// Error description.
        message: String,
    },

    /// The submitted query was rejected before any model call.
    #[error("invalid query: {reason}")]
    InvalidQuery {
        /// Why the query was rejected.
        reason: String,
    },

    /// The control loop hit its safety ceiling.
    #[error("control loop exceeded {max_steps} node executions (last node: {last_node})")]
    StepLimitExceeded {
        /// Configured ceiling.
        max_steps: usize,
        /// Node that was about to run when the ceiling was hit.
        last_node: String,
    },
}

/// Errors raised while loading the document corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus path is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No supported documents were found.
    #[error("no supported documents (.txt, .md, .json, .csv) found in {}", .0.display())]
    Empty(PathBuf),
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// A command argument was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}
