//! Reflection judge.
//!
//! Grades a generated answer for completeness and ambiguity. Runs on the
//! reasoning model, whose replies usually arrive wrapped in `<think>` blocks.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::judge::{Judged, evaluate};
use super::prompt::build_reflection_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{GenerationOutput, QueryAnalysis, ReflectionResult};

/// Agent that critiques one retrieval attempt.
pub struct ReflectionAgent {
    model: String,
    max_tokens: u32,
    json_mode: bool,
    system_prompt: String,
}

impl ReflectionAgent {
    /// Creates a new reflection agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.reasoning_model.clone(),
            max_tokens: config.judge_max_tokens,
            json_mode: config.json_mode,
            system_prompt,
        }
    }

    /// Reflects on `output` as an answer to `query`.
    pub async fn reflect(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        analysis: Option<&QueryAnalysis>,
        output: &GenerationOutput,
    ) -> Judged<ReflectionResult> {
        let user_msg = build_reflection_prompt(query, analysis, output);
        evaluate(self, provider, &user_msg).await
    }
}

#[async_trait]
impl Agent for ReflectionAgent {
    fn name(&self) -> &'static str {
        "reflection"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::REFLECTION_SYSTEM_PROMPT;
    use crate::agent::testing::ScriptedProvider;

    fn agent() -> ReflectionAgent {
        let config = AgentConfig::builder()
            .api_key("test")
            .reasoning_model("sonar-reasoning")
            .json_mode(true)
            .build()
            .unwrap_or_else(|_| unreachable!());
        ReflectionAgent::new(&config, REFLECTION_SYSTEM_PROMPT.to_string())
    }

    fn output() -> GenerationOutput {
        GenerationOutput::new("Q3 revenue was $4M [Source: q3.csv]", Vec::new(), 0.35)
    }

    #[tokio::test]
    async fn test_reflect_parses_think_wrapped_reply() {
        let provider = ScriptedProvider::new([
            "<think>The answer lacks the regional split.</think>\n```json\n{\"is_complete\": false, \"missing_elements\": [\"Regional_Breakdown\"], \"ambiguity_detected\": false, \"clarifying_question\": null, \"confidence_score\": 0.4}\n```",
        ]);
        let judged = agent()
            .reflect(&provider, "Q3 revenue by region?", None, &output())
            .await;

        assert!(!judged.fell_back);
        assert!(!judged.value.is_complete);
        assert_eq!(judged.value.missing_elements, vec!["Regional_Breakdown"]);
        assert!(judged.value.clarifying_question.is_none());

        let requests = provider.requests();
        assert_eq!(requests[0].model, "sonar-reasoning");
        assert!(requests[0].json_mode);
        assert!(
            requests[0].messages[1]
                .content
                .contains("ORIGINAL QUERY: Q3 revenue by region?")
        );
    }

    #[tokio::test]
    async fn test_reflect_falls_back_to_complete() {
        let provider = ScriptedProvider::new(["<think>out of budget"]);
        let judged = agent().reflect(&provider, "q", None, &output()).await;

        assert!(judged.fell_back);
        assert_eq!(judged.value, ReflectionResult::default());
    }
}
