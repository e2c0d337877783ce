//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Every command renders
//! its result to a `String`; the binary decides where it goes.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::agent::judge::parse_or_default;
use crate::agent::{
    AgentConfig, Orchestrator, PromptSet, RagEngine, create_provider, extract_json_payload,
};
use crate::cli::output::{OutputFormat, format_documents, format_judged, format_report};
use crate::cli::parser::{Cli, Commands, JudgeKind};
use crate::core::{QueryAnalysis, QueryReport, ReflectionResult};
use crate::corpus::DocumentCorpus;
use crate::error::{CommandError, Result};

/// Parameters for the query command.
#[derive(Debug, Clone)]
pub struct QueryParams<'a> {
    /// The question to answer.
    pub query: &'a str,
    /// Document directory.
    pub docs: &'a Path,
    /// Provider name override.
    pub provider: Option<&'a str>,
    /// Base URL override.
    pub base_url: Option<&'a str>,
    /// File holding the API key.
    pub api_key_file: Option<&'a Path>,
    /// Analysis and generation model override.
    pub chat_model: Option<&'a str>,
    /// Reflection model override.
    pub reasoning_model: Option<&'a str>,
    /// Retrieval attempt limit override.
    pub max_retries: Option<u32>,
    /// Node execution ceiling override.
    pub max_steps: Option<usize>,
    /// Documents per retrieval override.
    pub top_k: Option<usize>,
    /// Prompt template directory.
    pub prompt_dir: Option<&'a Path>,
    /// Request JSON judge replies.
    pub json_mode: bool,
    /// Append the execution trace to text output.
    pub trace: bool,
}

/// Executes the parsed CLI command.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Query {
            query,
            docs,
            provider,
            base_url,
            api_key_file,
            chat_model,
            reasoning_model,
            max_retries,
            max_steps,
            top_k,
            prompt_dir,
            json_mode,
            trace,
        } => {
            let params = QueryParams {
                query,
                docs,
                provider: provider.as_deref(),
                base_url: base_url.as_deref(),
                api_key_file: api_key_file.as_deref(),
                chat_model: chat_model.as_deref(),
                reasoning_model: reasoning_model.as_deref(),
                max_retries: *max_retries,
                max_steps: *max_steps,
                top_k: *top_k,
                prompt_dir: prompt_dir.as_deref(),
                json_mode: *json_mode,
                trace: *trace,
            };
            cmd_query(&params, format)
        }
        Commands::Documents { docs } => cmd_documents(docs, format),
        Commands::InspectReply { judge, file } => {
            cmd_inspect_reply(*judge, file.as_deref(), format)
        }
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Builds the agent configuration from the environment plus CLI overrides.
fn build_config(params: &QueryParams<'_>) -> Result<AgentConfig> {
    if params.top_k == Some(0) {
        return Err(CommandError::InvalidArgument("--top-k must be at least 1".to_string()).into());
    }
    if params.max_steps == Some(0) {
        return Err(
            CommandError::InvalidArgument("--max-steps must be at least 1".to_string()).into(),
        );
    }

    let mut builder = AgentConfig::builder();
    if let Some(path) = params.api_key_file {
        builder = builder.api_key_file(path);
    }
    if let Some(provider) = params.provider {
        builder = builder.provider(provider);
    }
    if let Some(url) = params.base_url {
        builder = builder.base_url(url);
    }
    if let Some(model) = params.chat_model {
        builder = builder.chat_model(model);
    }
    if let Some(model) = params.reasoning_model {
        builder = builder.reasoning_model(model);
    }
    if let Some(n) = params.max_retries {
        builder = builder.max_retries(n);
    }
    if let Some(n) = params.max_steps {
        builder = builder.max_steps(n);
    }
    if let Some(k) = params.top_k {
        builder = builder.top_k(k);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if params.json_mode {
        builder = builder.json_mode(true);
    }

    builder
        .from_env()
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into())
}

fn cmd_query(params: &QueryParams<'_>, format: OutputFormat) -> Result<String> {
    let corpus = DocumentCorpus::load(params.docs)?;
    let config = build_config(params)?;
    info!(
        documents = corpus.len(),
        provider = %config.provider,
        chat_model = %config.chat_model,
        reasoning_model = %config.reasoning_model,
        max_retries = config.max_retries,
        "starting query"
    );

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    let prompts = PromptSet::load(config.prompt_dir.as_deref());
    let engine = Arc::new(RagEngine::new(
        &config,
        prompts.answer.clone(),
        Arc::new(corpus),
        Arc::clone(&provider),
    ));
    let orchestrator = Orchestrator::with_prompts(provider, engine, &config, &prompts);

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let state = rt
        .block_on(orchestrator.process_query(params.query))
        .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;

    format_report(&QueryReport::from_state(&state), format, params.trace)
}

fn cmd_documents(docs: &Path, format: OutputFormat) -> Result<String> {
    let corpus = DocumentCorpus::load(docs)?;
    format_documents(&corpus, format)
}

fn cmd_inspect_reply(judge: JudgeKind, file: Option<&Path>, format: OutputFormat) -> Result<String> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to read {}: {e}", path.display()))
        })?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let payload = extract_json_payload(&raw);

    match judge {
        JudgeKind::Analysis => {
            let judged = parse_or_default::<QueryAnalysis>(&raw);
            format_judged(judge.as_str(), payload, &judged.value, judged.fell_back, format)
        }
        JudgeKind::Reflection => {
            let judged = parse_or_default::<ReflectionResult>(&raw);
            format_judged(judge.as_str(), payload, &judged.value, judged.fell_back, format)
        }
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                );
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize the judge and answer prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => OutputFormat::to_json(&serde_json::json!({
            "directory": target_dir.to_string_lossy(),
            "written": written
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>(),
            "count": written.len(),
        })),
    }
}
