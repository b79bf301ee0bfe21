//! Stage capability interface
//!
//! Every pipeline step is a `Stage` with typed input and output. The planner
//! holds stages as trait objects so any of them can be swapped for a stub.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Decomposition, Flowchart, FlowchartInput, PlanEvaluation, SubtaskList, Task};
use crate::llm::{CompletionResponse, LlmError};

/// Errors a single stage can raise
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl StageError {
    pub(crate) fn prompt(err: eyre::Report) -> Self {
        StageError::Prompt(format!("{:#}", err))
    }
}

/// Log token usage for one collaborator reply, warning when it was cut off
///
/// A truncated reply is still used as-is. Returns whether it was truncated.
pub(crate) fn log_reply(stage: &'static str, model: &str, response: &CompletionResponse) -> bool {
    let usage = response.usage;
    debug!(
        stage,
        %model,
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        total_tokens = usage.total(),
        "log_reply: called"
    );
    let truncated = response.is_truncated();
    if truncated {
        warn!(
            stage,
            %model,
            output_tokens = usage.output_tokens,
            "Reply hit the max-tokens budget and was cut off"
        );
    }
    truncated
}

/// One step of the planning pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    async fn run(&self, input: Self::Input) -> Result<Self::Output, StageError>;
}

/// Raw user input → primary goal
pub type ExtractStage = dyn Stage<Input = String, Output = Task>;

/// Primary goal → ordered subtasks
pub type DecomposeStage = dyn Stage<Input = Task, Output = Decomposition>;

/// Subtasks → readiness verdict
pub type EvaluateStage = dyn Stage<Input = SubtaskList, Output = PlanEvaluation>;

/// Subtasks (+ verdict) → DOT description
pub type FlowchartStage = dyn Stage<Input = FlowchartInput, Output = Flowchart>;
