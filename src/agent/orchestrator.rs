//! Reflective control loop.
//!
//! Runs one query through analyze → retrieve → (reflect) → finalize, with
//! optional clarification, enrichment, and retry detours chosen by the
//! reflection router. The loop is an explicit [`Node`] machine: each node
//! mutates the [`AgentState`], then the pure [`transition`] picks the next
//! node. The interpreter in [`Orchestrator::process_query`] owns the step
//! ceiling and writes exactly one trace entry per node.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::analyzer::QueryAnalysisAgent;
use super::augment::{
    Clarifier, DEFAULT_CLARIFYING_QUESTION, Enricher, PlaceholderClarifier, PlaceholderEnricher,
};
use super::config::AgentConfig;
use super::engine::AnswerEngine;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::reflector::ReflectionAgent;
use super::suggestions::synthesize;
use crate::core::{AgentState, EnrichedData, GenerationOutput, ReflectionResult};
use crate::error::AgentError;

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// Engine confidence above which a sourced answer skips reflection.
pub const SKIP_REFLECTION_CONFIDENCE: f64 = 0.7;

/// Judge confidence above which a complete answer is accepted.
pub const COMPLETION_CONFIDENCE: f64 = 0.6;

/// Attempts below which ambiguity and enrichment detours are allowed.
pub const DETOUR_ATTEMPT_LIMIT: u32 = 2;

/// Missing elements enriched per pass.
pub const MAX_ENRICHED_ELEMENTS: usize = 2;

/// Answer used if finalization runs without any generation output.
const NO_ANSWER: &str = "No answer generated.";

/// Appended to the reflection trace entry when the retry budget forced completion.
pub const FORCED_COMPLETION_NOTE: &str = " (forced: retry budget exhausted)";

/// A step of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// Classify and decompose the query.
    AnalyzeQuery,
    /// Retrieve context and generate an answer.
    ExecuteRetrieval,
    /// Grade the latest answer.
    ReflectOnOutput,
    /// Obtain a clarification for an ambiguous query.
    HandleAmbiguity,
    /// Fill in missing data elements.
    EnrichData,
    /// Produce the final answer and suggestions. Terminal.
    GenerateFinalAnswer,
}

impl Node {
    /// Snake-case name used in the trace.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeQuery => "analyze_query",
            Self::ExecuteRetrieval => "execute_retrieval",
            Self::ReflectOnOutput => "reflect_on_output",
            Self::HandleAmbiguity => "handle_ambiguity",
            Self::EnrichData => "enrich_data",
            Self::GenerateFinalAnswer => "generate_final_answer",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the post-reflection router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Finalize.
    Complete,
    /// Ask for clarification, then retrieve again.
    Ambiguous,
    /// Enrich missing elements, then retrieve again.
    Incomplete,
    /// Retrieve again unchanged.
    Retry,
}

impl Route {
    /// Node the route leads to.
    #[must_use]
    pub const fn target(self) -> Node {
        match self {
            Self::Complete => Node::GenerateFinalAnswer,
            Self::Ambiguous => Node::HandleAmbiguity,
            Self::Incomplete => Node::EnrichData,
            Self::Retry => Node::ExecuteRetrieval,
        }
    }

    /// Lowercase label used in the trace.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Ambiguous => "ambiguous",
            Self::Incomplete => "incomplete",
            Self::Retry => "retry",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a retrieval result needs reflection.
///
/// Skipped only when the engine is confident (strictly above
/// [`SKIP_REFLECTION_CONFIDENCE`]) and cited at least one source.
#[must_use]
pub fn should_reflect(output: &GenerationOutput) -> bool {
    !(output.confidence > SKIP_REFLECTION_CONFIDENCE && !output.sources.is_empty())
}

/// Picks the next step after reflection. First matching rule wins:
///
/// 1. attempts exhausted → complete
/// 2. complete and judge confidence above [`COMPLETION_CONFIDENCE`] → complete
/// 3. ambiguous with attempts left under [`DETOUR_ATTEMPT_LIMIT`] → ambiguous
/// 4. incomplete with named gaps and attempts under the limit → incomplete
/// 5. attempts left → retry
/// 6. complete
#[must_use]
pub fn route_after_reflection(
    reflection: &ReflectionResult,
    retry_count: u32,
    max_retries: u32,
) -> Route {
    if retry_count >= max_retries {
        Route::Complete
    } else if reflection.is_complete && reflection.confidence_score > COMPLETION_CONFIDENCE {
        Route::Complete
    } else if reflection.ambiguity_detected && retry_count < DETOUR_ATTEMPT_LIMIT {
        Route::Ambiguous
    } else if !reflection.is_complete
        && !reflection.missing_elements.is_empty()
        && retry_count < DETOUR_ATTEMPT_LIMIT
    {
        Route::Incomplete
    } else if retry_count < max_retries {
        Route::Retry
    } else {
        Route::Complete
    }
}

/// Next node after `node` has run against `state`, or `None` when done.
#[must_use]
pub fn transition(node: Node, state: &AgentState, max_retries: u32) -> Option<Node> {
    match node {
        Node::AnalyzeQuery | Node::HandleAmbiguity | Node::EnrichData => {
            Some(Node::ExecuteRetrieval)
        }
        Node::ExecuteRetrieval => {
            if state.generation_output.as_ref().is_none_or(should_reflect) {
                Some(Node::ReflectOnOutput)
            } else {
                Some(Node::GenerateFinalAnswer)
            }
        }
        Node::ReflectOnOutput => {
            let fallback = ReflectionResult::default();
            let reflection = state.reflection_result.as_ref().unwrap_or(&fallback);
            Some(route_after_reflection(reflection, state.retry_count, max_retries).target())
        }
        Node::GenerateFinalAnswer => None,
    }
}

/// Upper bound on node executions for a given retry budget.
#[must_use]
pub const fn step_bound(max_retries: u32) -> usize {
    let attempts = if max_retries == 0 { 1 } else { max_retries as usize };
    3 * attempts + 2
}

/// Runs queries through the reflective loop.
///
/// Holds only shared, immutable collaborators; every call to
/// [`process_query`](Self::process_query) owns its own [`AgentState`], so one
/// orchestrator can serve concurrent queries.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    engine: Arc<dyn AnswerEngine>,
    clarifier: Arc<dyn Clarifier>,
    enricher: Arc<dyn Enricher>,
    analyzer: QueryAnalysisAgent,
    reflector: ReflectionAgent,
    max_retries: u32,
    max_steps: usize,
}

impl Orchestrator {
    /// Creates an orchestrator with placeholder clarification and enrichment.
    ///
    /// Loads prompt templates from [`AgentConfig::prompt_dir`], falling back
    /// to compiled-in defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        engine: Arc<dyn AnswerEngine>,
        config: &AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, engine, config, &prompts)
    }

    /// Creates an orchestrator using an explicit prompt set.
    #[must_use]
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        engine: Arc<dyn AnswerEngine>,
        config: &AgentConfig,
        prompts: &PromptSet,
    ) -> Self {
        Self {
            provider,
            engine,
            clarifier: Arc::new(PlaceholderClarifier),
            enricher: Arc::new(PlaceholderEnricher),
            analyzer: QueryAnalysisAgent::new(config, prompts.analysis.clone()),
            reflector: ReflectionAgent::new(config, prompts.reflection.clone()),
            max_retries: config.max_retries,
            max_steps: config.max_steps,
        }
    }

    /// Replaces the clarification source.
    #[must_use]
    pub fn with_clarifier(mut self, clarifier: Arc<dyn Clarifier>) -> Self {
        self.clarifier = clarifier;
        self
    }

    /// Replaces the enrichment source.
    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Runs `query` through the loop and returns the final state.
    ///
    /// # Errors
    ///
    /// - [`AgentError::InvalidQuery`] for an empty or oversized query
    /// - any error from the answer engine, clarifier, or enricher
    /// - [`AgentError::StepLimitExceeded`] if the node ceiling is reached
    ///
    /// Judge failures never surface here; they fall back to defaults.
    pub async fn process_query(&self, query: &str) -> Result<AgentState, AgentError> {
        validate_query(query)?;

        let mut state = AgentState::new(query);
        let mut next = Some(Node::AnalyzeQuery);
        let mut steps = 0usize;

        while let Some(node) = next {
            if steps >= self.max_steps {
                return Err(AgentError::StepLimitExceeded {
                    max_steps: self.max_steps,
                    last_node: node.to_string(),
                });
            }
            steps += 1;
            debug!(node = %node, step = steps, retry_count = state.retry_count, "entering node");

            let mut entry = self.run_node(node, &mut state).await?;
            next = transition(node, &state, self.max_retries);

            match (node, next) {
                (Node::ExecuteRetrieval, Some(Node::GenerateFinalAnswer)) => {
                    entry.push_str("; reflection skipped");
                }
                (Node::ReflectOnOutput, Some(target)) => {
                    let _ = write!(entry, " -> {target}");
                    if state.retry_count >= self.max_retries {
                        entry.push_str(FORCED_COMPLETION_NOTE);
                    }
                }
                _ => {}
            }
            state.record(entry);
        }

        info!(
            steps,
            retry_count = state.retry_count,
            suggestions = state.enrichment_suggestions.as_ref().map_or(0, Vec::len),
            "query processed"
        );
        Ok(state)
    }

    /// Executes one node, returning its trace entry.
    async fn run_node(&self, node: Node, state: &mut AgentState) -> Result<String, AgentError> {
        match node {
            Node::AnalyzeQuery => Ok(self.analyze(state).await),
            Node::ExecuteRetrieval => self.execute_retrieval(state).await,
            Node::ReflectOnOutput => Ok(self.reflect(state).await),
            Node::HandleAmbiguity => self.handle_ambiguity(state).await,
            Node::EnrichData => self.enrich(state).await,
            Node::GenerateFinalAnswer => Ok(finalize(state)),
        }
    }

    async fn analyze(&self, state: &mut AgentState) -> String {
        let judged = self
            .analyzer
            .analyze(self.provider.as_ref(), &state.user_query)
            .await;
        let analysis = judged.value;

        let mut entry = format!(
            "{}: intent={}, confidence={:.2}, sub_questions={}",
            Node::AnalyzeQuery,
            analysis.intent,
            analysis.confidence,
            analysis.sub_questions.len()
        );
        if judged.fell_back {
            entry.push_str(" (default analysis)");
        }
        state.query_analysis = Some(analysis);
        entry
    }

    async fn execute_retrieval(&self, state: &mut AgentState) -> Result<String, AgentError> {
        state.retry_count += 1;
        let query = state.retrieval_query();

        let output = self
            .engine
            .retrieve_and_generate(&query, state.query_analysis.as_ref())
            .await?
            .normalized();
        info!(
            attempt = state.retry_count,
            confidence = output.confidence,
            sources = output.sources.len(),
            "retrieval attempt finished"
        );

        let entry = format!(
            "{} (attempt {}): confidence={:.2}, sources={}",
            Node::ExecuteRetrieval,
            state.retry_count,
            output.confidence,
            output.sources.len()
        );
        state.generation_output = Some(output);
        Ok(entry)
    }

    async fn reflect(&self, state: &mut AgentState) -> String {
        let fallback_output;
        let output = if let Some(output) = state.generation_output.as_ref() {
            output
        } else {
            fallback_output = GenerationOutput::new(NO_ANSWER, Vec::new(), 0.0);
            &fallback_output
        };
        let judged = self
            .reflector
            .reflect(
                self.provider.as_ref(),
                &state.user_query,
                state.query_analysis.as_ref(),
                output,
            )
            .await;
        let reflection = judged.value;

        if state.retry_count >= self.max_retries {
            warn!(
                retry_count = state.retry_count,
                max_retries = self.max_retries,
                "retry budget exhausted; forcing completion"
            );
        }

        let mut entry = format!(
            "{}: complete={}, ambiguity={}, missing_elements={}, confidence={:.2}",
            Node::ReflectOnOutput,
            reflection.is_complete,
            reflection.ambiguity_detected,
            reflection.missing_elements.len(),
            reflection.confidence_score
        );
        if judged.fell_back {
            entry.push_str(" (default reflection)");
        }
        state.reflection_result = Some(reflection);
        entry
    }

    async fn handle_ambiguity(&self, state: &mut AgentState) -> Result<String, AgentError> {
        let question = state
            .reflection_result
            .as_ref()
            .and_then(|r| r.clarifying_question.clone())
            .unwrap_or_else(|| DEFAULT_CLARIFYING_QUESTION.to_string());

        let clarification = self
            .clarifier
            .clarify(&state.user_query, &question)
            .await?;
        debug!(%question, %clarification, "clarification obtained");

        let entry = format!(
            "{}: asked \"{question}\", clarification \"{clarification}\"",
            Node::HandleAmbiguity
        );
        state.clarification_response = Some(clarification);
        Ok(entry)
    }

    async fn enrich(&self, state: &mut AgentState) -> Result<String, AgentError> {
        let elements: Vec<String> = state
            .reflection_result
            .as_ref()
            .map(|r| {
                r.missing_elements
                    .iter()
                    .take(MAX_ENRICHED_ELEMENTS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut enriched = EnrichedData::new();
        for element in elements {
            let value = self.enricher.enrich(&element).await?;
            enriched.insert(element, value);
        }

        let entry = format!(
            "{}: enriched [{}]",
            Node::EnrichData,
            enriched.keys().collect::<Vec<_>>().join(", ")
        );
        state.enriched_data = Some(enriched);
        Ok(entry)
    }
}

/// Terminal step: assembles the final answer and suggestions.
fn finalize(state: &mut AgentState) -> String {
    let mut answer = state
        .generation_output
        .as_ref()
        .map_or_else(|| NO_ANSWER.to_string(), |g| g.answer.clone());

    if let Some(enriched) = state.enriched_data.as_ref().filter(|e| !e.is_empty()) {
        answer.push_str("\n\nAdditional enriched data:\n");
        let lines: Vec<String> = enriched.iter().map(|(k, v)| format!("- {k}: {v}")).collect();
        answer.push_str(&lines.join("\n"));
    }

    let suggestions = synthesize(
        state.reflection_result.as_ref(),
        state.generation_output.as_ref(),
    );
    let entry = format!(
        "{}: answer ready, suggestions={}",
        Node::GenerateFinalAnswer,
        suggestions.len()
    );

    state.enrichment_suggestions = Some(suggestions);
    state.final_answer = Some(answer);
    entry
}

fn validate_query(query: &str) -> Result<(), AgentError> {
    if query.trim().is_empty() {
        return Err(AgentError::InvalidQuery {
            reason: "query cannot be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(AgentError::InvalidQuery {
            reason: format!(
                "query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                query.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;
    use async_trait::async_trait;
    use test_case::test_case;

    fn output(confidence: f64, sources: &[&str]) -> GenerationOutput {
        GenerationOutput::new(
            "answer",
            sources.iter().map(|s| (*s).to_string()).collect(),
            confidence,
        )
    }

    #[test_case(0.85, &["hr_policy.md"], false ; "confident and sourced skips")]
    #[test_case(0.7, &["hr_policy.md"], true ; "boundary reflects")]
    #[test_case(0.71, &[], true ; "unsourced reflects")]
    #[test_case(0.3, &["a.md", "b.md"], true ; "low confidence reflects")]
    fn test_should_reflect(confidence: f64, sources: &[&str], expected: bool) {
        assert_eq!(should_reflect(&output(confidence, sources)), expected);
    }

    fn reflection(complete: bool, ambiguous: bool, missing: usize, score: f64) -> ReflectionResult {
        ReflectionResult {
            is_complete: complete,
            ambiguity_detected: ambiguous,
            missing_elements: (0..missing).map(|i| format!("element_{i}")).collect(),
            confidence_score: score,
            ..ReflectionResult::default()
        }
    }

    #[test_case(reflection(false, true, 2, 0.2), 1, 1, Route::Complete ; "budget exhausted forces completion")]
    #[test_case(reflection(true, false, 0, 0.9), 1, 3, Route::Complete ; "confident complete")]
    #[test_case(reflection(true, false, 0, 0.6), 1, 3, Route::Retry ; "complete at threshold retries")]
    #[test_case(reflection(true, true, 0, 0.5), 1, 3, Route::Ambiguous ; "ambiguity before enrichment")]
    #[test_case(reflection(false, true, 2, 0.5), 2, 3, Route::Retry ; "detours closed at two attempts")]
    #[test_case(reflection(false, false, 2, 0.5), 1, 3, Route::Incomplete ; "named gaps enrich")]
    #[test_case(reflection(false, false, 0, 0.5), 1, 3, Route::Retry ; "unnamed gaps retry")]
    #[test_case(reflection(false, false, 0, 0.5), 0, 0, Route::Complete ; "zero budget")]
    fn test_route_after_reflection(r: ReflectionResult, retry_count: u32, max: u32, expected: Route) {
        assert_eq!(route_after_reflection(&r, retry_count, max), expected);
    }

    #[test]
    fn test_default_budget_always_completes_after_first_attempt() {
        for complete in [true, false] {
            for ambiguous in [true, false] {
                let r = reflection(complete, ambiguous, 3, 0.1);
                assert_eq!(route_after_reflection(&r, 1, 1), Route::Complete);
            }
        }
    }

    #[test]
    fn test_transition_table() {
        let mut state = AgentState::new("q");
        assert_eq!(
            transition(Node::AnalyzeQuery, &state, 1),
            Some(Node::ExecuteRetrieval)
        );
        assert_eq!(
            transition(Node::HandleAmbiguity, &state, 1),
            Some(Node::ExecuteRetrieval)
        );
        assert_eq!(transition(Node::GenerateFinalAnswer, &state, 1), None);

        state.generation_output = Some(output(0.9, &["a.md"]));
        assert_eq!(
            transition(Node::ExecuteRetrieval, &state, 1),
            Some(Node::GenerateFinalAnswer)
        );

        state.retry_count = 1;
        state.reflection_result = Some(reflection(false, true, 1, 0.1));
        assert_eq!(
            transition(Node::ReflectOnOutput, &state, 1),
            Some(Node::GenerateFinalAnswer)
        );
        assert_eq!(
            transition(Node::ReflectOnOutput, &state, 2),
            Some(Node::HandleAmbiguity)
        );
    }

    #[test_case(0, 5)]
    #[test_case(1, 5)]
    #[test_case(3, 11)]
    fn test_step_bound(max_retries: u32, expected: usize) {
        assert_eq!(step_bound(max_retries), expected);
    }

    struct StaticEngine(GenerationOutput);

    #[async_trait]
    impl AnswerEngine for StaticEngine {
        async fn retrieve_and_generate(
            &self,
            _query: &str,
            _analysis: Option<&crate::core::QueryAnalysis>,
        ) -> Result<GenerationOutput, AgentError> {
            Ok(self.0.clone())
        }
    }

    fn orchestrator(provider: ScriptedProvider, engine: StaticEngine, max_steps: usize) -> Orchestrator {
        let config = AgentConfig::builder()
            .api_key("test")
            .max_steps(max_steps)
            .build()
            .unwrap_or_else(|_| unreachable!());
        Orchestrator::with_prompts(
            Arc::new(provider),
            Arc::new(engine),
            &config,
            &PromptSet::defaults(),
        )
    }

    #[tokio::test]
    async fn test_process_query_rejects_empty() {
        let orch = orchestrator(
            ScriptedProvider::new(["{}"]),
            StaticEngine(output(0.9, &["a.md"])),
            32,
        );
        let result = orch.process_query("   ").await;
        assert!(matches!(result, Err(AgentError::InvalidQuery { .. })));
    }

    #[tokio::test]
    async fn test_process_query_rejects_oversized() {
        let orch = orchestrator(
            ScriptedProvider::new(["{}"]),
            StaticEngine(output(0.9, &["a.md"])),
            32,
        );
        let result = orch.process_query(&"x".repeat(MAX_QUERY_LEN + 1)).await;
        assert!(matches!(result, Err(AgentError::InvalidQuery { .. })));
    }

    #[tokio::test]
    async fn test_judge_fallbacks_are_traced() {
        let orch = orchestrator(
            ScriptedProvider::new(["not json"]),
            StaticEngine(output(0.2, &[])),
            32,
        );
        let state = orch
            .process_query("What changed?")
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(state.execution_trace.len(), 4);
        assert!(state.execution_trace[0].ends_with("(default analysis)"));
        assert!(
            state.execution_trace[2]
                .contains("(default reflection) -> generate_final_answer")
        );
        assert!(state.execution_trace[2].ends_with(FORCED_COMPLETION_NOTE));
        assert_eq!(state.retry_count, 1);
    }

    #[tokio::test]
    async fn test_retrieval_trace_reports_normalized_output() {
        let raw = GenerationOutput {
            answer: "Leave is approved by managers.".to_string(),
            sources: vec!["a.md".to_string(), "a.md".to_string()],
            confidence: 1.7,
            execution_time_ms: 0,
        };
        let orch = orchestrator(ScriptedProvider::new(["{}"]), StaticEngine(raw), 32);
        let state = orch
            .process_query("Who approves leave?")
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(
            state.execution_trace[1],
            "execute_retrieval (attempt 1): confidence=1.00, sources=1; reflection skipped"
        );
        let stored = state
            .generation_output
            .unwrap_or_else(|| panic!("no generation output"));
        assert_eq!(stored.sources, vec!["a.md".to_string()]);
        assert!((stored.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unforced_completion_has_no_forced_note() {
        let config = AgentConfig::builder()
            .api_key("test")
            .max_retries(3)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let orch = Orchestrator::with_prompts(
            Arc::new(ScriptedProvider::new([
                "{}",
                r#"{"is_complete": true, "confidence_score": 0.9}"#,
            ])),
            Arc::new(StaticEngine(output(0.2, &[]))),
            &config,
            &PromptSet::defaults(),
        );
        let state = orch
            .process_query("q")
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert!(state.execution_trace[2].ends_with("-> generate_final_answer"));
        assert!(!state.execution_trace[2].contains("forced"));
    }

    #[tokio::test]
    async fn test_step_ceiling() {
        let orch = orchestrator(
            ScriptedProvider::new(["{}"]),
            StaticEngine(output(0.2, &[])),
            2,
        );
        let result = orch.process_query("q").await;
        assert!(matches!(
            result,
            Err(AgentError::StepLimitExceeded { max_steps: 2, ref last_node })
                if last_node == "reflect_on_output"
        ));
    }
}
