//! Query-analysis judge.
//!
//! Classifies the user query and decomposes it into sub-questions and
//! required data elements that later steer retrieval.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::judge::{Judged, evaluate};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::QueryAnalysis;

/// Agent that analyzes a query before retrieval.
pub struct QueryAnalysisAgent {
    model: String,
    max_tokens: u32,
    json_mode: bool,
    system_prompt: String,
}

impl QueryAnalysisAgent {
    /// Creates a new analysis agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.chat_model.clone(),
            max_tokens: config.judge_max_tokens,
            json_mode: config.json_mode,
            system_prompt,
        }
    }

    /// Analyzes `query`. The returned record always carries `original_query`.
    ///
    /// Malformed replies and provider failures yield the default analysis
    /// with `fell_back` set.
    pub async fn analyze(&self, provider: &dyn LlmProvider, query: &str) -> Judged<QueryAnalysis> {
        let mut judged: Judged<QueryAnalysis> = evaluate(self, provider, query).await;
        judged.value.original_query = Some(query.to_string());
        judged
    }
}

#[async_trait]
impl Agent for QueryAnalysisAgent {
    fn name(&self) -> &'static str {
        "query_analysis"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        self.json_mode
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
