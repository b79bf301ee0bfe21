//! PlanEvaluator - classifies a subtask list as ready or needing improvement
//!
//! Readiness is a case-insensitive substring test for "improvement" in the
//! collaborator's reply. A reply such as "no improvement needed" reads as
//! not ready.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::stage::log_reply;
use super::{PlanEvaluation, Stage, StageError, SubtaskList};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};

/// Marker whose presence means the plan is not ready
const IMPROVEMENT_MARKER: &str = "improvement";

/// Classify an evaluator reply
///
/// When the plan is not ready the whole reply is kept as the suggestions.
pub fn classify(reply: &str) -> PlanEvaluation {
    let reply = reply.trim();
    let ready = !reply.to_lowercase().contains(IMPROVEMENT_MARKER);
    debug!(%ready, "classify: called");

    PlanEvaluation {
        ready,
        suggestions: if ready || reply.is_empty() {
            None
        } else {
            Some(reply.to_string())
        },
    }
}

/// Single collaborator call over the newline-joined subtasks
pub struct PlanEvaluator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl PlanEvaluator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    pub async fn evaluate(&self, subtasks: &SubtaskList) -> Result<PlanEvaluation, StageError> {
        debug!(subtask_count = subtasks.len(), "evaluate: called");
        let context = PromptContext {
            subtask_count: subtasks.len(),
            ..Default::default()
        };
        let system_prompt = self.prompts.render("evaluator", &context).map_err(StageError::prompt)?;

        let request = CompletionRequest::single(
            system_prompt,
            format!("Subtasks:\n{}", subtasks.joined()),
            self.max_tokens,
        );
        let response = self.llm.complete(request).await?;
        log_reply("evaluator", self.llm.model(), &response);
        let evaluation = classify(&response.trimmed_text());

        info!(
            model = %self.llm.model(),
            ready = evaluation.ready,
            tokens = response.usage.total(),
            "Plan evaluated"
        );
        Ok(evaluation)
    }
}

#[async_trait]
impl Stage for PlanEvaluator {
    type Input = SubtaskList;
    type Output = PlanEvaluation;

    fn name(&self) -> &'static str {
        "evaluator"
    }

    async fn run(&self, input: SubtaskList) -> Result<PlanEvaluation, StageError> {
        self.evaluate(&input).await
    }
}
