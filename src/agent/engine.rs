//! Retrieval-and-generation engine.
//!
//! The control loop only sees [`AnswerEngine`]. [`RagEngine`] is the
//! reference implementation: it retrieves context through a [`Retriever`],
//! generates a grounded answer with the chat model, and scores the result
//! with [`score_confidence`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use super::config::AgentConfig;
use super::prompt::{ContextDocument, build_answer_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{GenerationOutput, QueryAnalysis, clamp_unit};
use crate::error::AgentError;

/// Answer substituted when the generator returns nothing.
pub const EMPTY_REPLY_ANSWER: &str = "No response generated.";

/// Source name the engine treats as absent.
const UNKNOWN_SOURCE: &str = "unknown";

/// Phrases that signal the answer could not be grounded, matched
/// case-insensitively.
const UNCERTAINTY_PHRASES: [&str; 5] = [
    "i don't know",
    "information is missing",
    "not in the context",
    "unable to find",
    "no information provided",
];

/// Produces an answer for a (possibly clarified) query.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    /// Retrieves context and generates an answer.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the query being processed.
    async fn retrieve_and_generate(
        &self,
        query: &str,
        analysis: Option<&QueryAnalysis>,
    ) -> Result<GenerationOutput, AgentError>;
}

/// A document returned by a [`Retriever`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    /// Source name used for citations.
    pub source: String,
    /// Document text.
    pub content: String,
    /// Retrieval score; higher is more relevant.
    pub score: f64,
}

/// Ranked document lookup.
pub trait Retriever: Send + Sync {
    /// Returns up to `top_k` documents for `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Retrieval`] when the store cannot be queried.
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>, AgentError>;
}

/// Appends the analysis hints to the retrieval query.
///
/// Sub-questions are joined with spaces; required elements follow a
/// `Relevant data:` marker. Without an analysis the query is unchanged.
#[must_use]
pub fn enhance_query(query: &str, analysis: Option<&QueryAnalysis>) -> String {
    let mut enhanced = query.to_string();
    let Some(analysis) = analysis else {
        return enhanced;
    };

    if !analysis.sub_questions.is_empty() {
        enhanced.push(' ');
        enhanced.push_str(&analysis.sub_questions.join(" "));
    }
    if !analysis.required_data_elements.is_empty() {
        enhanced.push_str(" Relevant data: ");
        enhanced.push_str(&analysis.required_data_elements.join(", "));
    }
    enhanced
}

/// Scores an answer in `[0, 1]` from source count, hedging, and length.
///
/// `0.4·min(n/5, 1) + 0.4·(1 − min(0.2·k, 1)) + 0.2·min(words/50, 1)` where
/// `k` counts distinct uncertainty phrases present. A blank answer scores 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_confidence(answer: &str, source_count: usize) -> f64 {
    if answer.trim().is_empty() {
        return 0.0;
    }

    let lower = answer.to_lowercase();
    let hedges = UNCERTAINTY_PHRASES
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .count();
    let words = answer.split_whitespace().count();

    let source_confidence = (source_count as f64 / 5.0).min(1.0);
    let uncertainty = (0.2 * hedges as f64).min(1.0);
    let length_confidence = (words as f64 / 50.0).min(1.0);

    clamp_unit(0.4 * source_confidence + 0.4 * (1.0 - uncertainty) + 0.2 * length_confidence)
}

/// Chat-model role that writes the grounded answer.
struct AnswerGenerator {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

#[async_trait]
impl Agent for AnswerGenerator {
    fn name(&self) -> &'static str {
        "answer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> Option<f32> {
        Some(self.temperature)
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Reference [`AnswerEngine`]: retrieve, generate, score.
pub struct RagEngine {
    retriever: Arc<dyn Retriever>,
    provider: Arc<dyn LlmProvider>,
    generator: AnswerGenerator,
    top_k: usize,
}

impl RagEngine {
    /// Creates an engine over `retriever` that generates with `provider`.
    #[must_use]
    pub fn new(
        config: &AgentConfig,
        system_prompt: String,
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            retriever,
            provider,
            generator: AnswerGenerator {
                model: config.chat_model.clone(),
                max_tokens: config.generation_max_tokens,
                temperature: config.generation_temperature,
                system_prompt,
            },
            top_k: config.top_k,
        }
    }
}

#[async_trait]
impl AnswerEngine for RagEngine {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        analysis: Option<&QueryAnalysis>,
    ) -> Result<GenerationOutput, AgentError> {
        let start = Instant::now();

        let search_query = enhance_query(query, analysis);
        let documents = self.retriever.retrieve(&search_query, self.top_k)?;
        debug!(
            documents = documents.len(),
            top_k = self.top_k,
            "retrieved context"
        );

        let prompt = {
            let context: Vec<ContextDocument<'_>> = documents
                .iter()
                .map(|d| ContextDocument {
                    source: &d.source,
                    content: &d.content,
                })
                .collect();
            build_answer_prompt(query, &context)
        };
        let response = self
            .generator
            .execute(self.provider.as_ref(), &prompt)
            .await?;

        let sources: Vec<String> = documents
            .into_iter()
            .map(|d| d.source)
            .filter(|s| !s.is_empty() && s != UNKNOWN_SOURCE)
            .collect();

        let blank = response.content.trim().is_empty();
        let answer = if blank {
            EMPTY_REPLY_ANSWER.to_string()
        } else {
            response.content
        };
        let output = GenerationOutput::new(answer, sources, 0.0);
        // The placeholder is never scored; a blank reply has zero confidence.
        let confidence = if blank {
            0.0
        } else {
            score_confidence(&output.answer, output.sources.len())
        };
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            sources = output.sources.len(),
            confidence,
            elapsed_ms,
            "generated answer"
        );

        Ok(GenerationOutput {
            confidence,
            ..output
        }
        .with_execution_time_ms(elapsed_ms))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::prompt::ANSWER_SYSTEM_PROMPT;
    use crate::agent::testing::ScriptedProvider;
    use std::sync::Mutex;
    use test_case::test_case;

    struct FixedRetriever {
        documents: Vec<RetrievedDocument>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl FixedRetriever {
        fn new(sources: &[&str]) -> Self {
            Self {
                documents: sources
                    .iter()
                    .map(|s| RetrievedDocument {
                        source: (*s).to_string(),
                        content: format!("contents of {s}"),
                        score: 1.0,
                    })
                    .collect(),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl Retriever for FixedRetriever {
        fn retrieve(
            &self,
            query: &str,
            top_k: usize,
        ) -> Result<Vec<RetrievedDocument>, AgentError> {
            self.queries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((query.to_string(), top_k));
            Ok(self.documents.iter().take(top_k).cloned().collect())
        }
    }

    struct BrokenRetriever;

    impl Retriever for BrokenRetriever {
        fn retrieve(&self, _: &str, _: usize) -> Result<Vec<RetrievedDocument>, AgentError> {
            Err(AgentError::Retrieval {
                message: "index offline".to_string(),
            })
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .top_k(3)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test_case(&words(50), 5, 1.0 ; "full marks")]
    #[test_case("", 5, 0.0 ; "empty answer")]
    #[test_case("   \n", 3, 0.0 ; "blank answer")]
    #[test_case(&words(25), 0, 0.5 ; "no sources half length")]
    #[test_case("I don't know. The information is missing.", 0, 0.268 ; "two hedges")]
    #[test_case("I DON'T KNOW", 10, 0.732 ; "hedge case insensitive")]
    fn test_score_confidence(answer: &str, sources: usize, expected: f64) {
        let score = score_confidence(answer, sources);
        assert!((score - expected).abs() < 1e-9, "{score} != {expected}");
    }

    #[test]
    fn test_enhance_query() {
        let analysis = QueryAnalysis {
            sub_questions: vec!["What is the policy?".to_string(), "Who approves?".to_string()],
            required_data_elements: vec!["leave_days".to_string(), "approver".to_string()],
            ..QueryAnalysis::default()
        };
        assert_eq!(
            enhance_query("Leave rules", Some(&analysis)),
            "Leave rules What is the policy? Who approves? Relevant data: leave_days, approver"
        );
        assert_eq!(enhance_query("Leave rules", None), "Leave rules");
        assert_eq!(
            enhance_query("Leave rules", Some(&QueryAnalysis::default())),
            "Leave rules"
        );
    }

    #[tokio::test]
    async fn test_rag_engine_generates_with_sources() {
        let retriever = Arc::new(FixedRetriever::new(&[
            "hr_policy.md",
            "unknown",
            "hr_policy.md",
            "faq.txt",
        ]));
        let provider = Arc::new(ScriptedProvider::new([
            "Employees get 25 days [Source: hr_policy.md]",
        ]));
        let engine = RagEngine::new(
            &config(),
            ANSWER_SYSTEM_PROMPT.to_string(),
            retriever.clone(),
            provider.clone(),
        );

        let output = engine
            .retrieve_and_generate("How much leave?", None)
            .await
            .unwrap_or_else(|e| panic!("engine failed: {e}"));

        // top_k = 3 keeps the first three documents
        assert_eq!(output.sources, vec!["hr_policy.md".to_string()]);
        assert_eq!(output.answer, "Employees get 25 days [Source: hr_policy.md]");
        assert!((output.confidence - score_confidence(&output.answer, 1)).abs() < 1e-9);

        let queries = retriever
            .queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(queries, vec![("How much leave?".to_string(), 3)]);

        let requests = provider.requests();
        assert_eq!(requests[0].temperature, Some(0.1));
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert!(requests[0].messages[1].content.contains("Source: hr_policy.md"));
    }

    #[tokio::test]
    async fn test_rag_engine_empty_reply() {
        let engine = RagEngine::new(
            &config(),
            ANSWER_SYSTEM_PROMPT.to_string(),
            Arc::new(FixedRetriever::new(&[])),
            Arc::new(ScriptedProvider::new([""])),
        );
        let output = engine
            .retrieve_and_generate("q", None)
            .await
            .unwrap_or_else(|e| panic!("engine failed: {e}"));
        assert_eq!(output.answer, EMPTY_REPLY_ANSWER);
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_rag_engine_blank_reply_with_sources_scores_zero() {
        let config = AgentConfig::builder()
            .api_key("test")
            .top_k(5)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let engine = RagEngine::new(
            &config,
            ANSWER_SYSTEM_PROMPT.to_string(),
            Arc::new(FixedRetriever::new(&["a.md", "b.md", "c.md", "d.md", "e.md"])),
            Arc::new(ScriptedProvider::new(["  \n"])),
        );
        let output = engine
            .retrieve_and_generate("q", None)
            .await
            .unwrap_or_else(|e| panic!("engine failed: {e}"));

        assert_eq!(output.answer, EMPTY_REPLY_ANSWER);
        assert_eq!(output.sources.len(), 5);
        assert!(output.confidence.abs() < f64::EPSILON);
        assert!(crate::agent::orchestrator::should_reflect(&output));
    }

    #[tokio::test]
    async fn test_rag_engine_propagates_retrieval_error() {
        let engine = RagEngine::new(
            &config(),
            ANSWER_SYSTEM_PROMPT.to_string(),
            Arc::new(BrokenRetriever),
            Arc::new(ScriptedProvider::new(["unused"])),
        );
        let result = engine.retrieve_and_generate("q", None).await;
        assert!(matches!(result, Err(AgentError::Retrieval { .. })));
    }
}
