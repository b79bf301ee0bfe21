//! Planner - sequences extractor → decomposer → evaluator → flowchart
//!
//! Stages run strictly one after another; each output feeds the next input.
//! The first failure aborts the run and is reported with the stage name.

use std::sync::Arc;
use std::time::Instant;

use eyre::{Context, Result};
use thiserror::Error;
use tracing::{Instrument, info, info_span};

use super::{
    DecomposeStage, EvaluateStage, ExtractStage, FlowchartInput, FlowchartStage, LlmFlowchart, PlanEvaluation,
    PlanEvaluator, PlanResult, Stage, StageError, SubtaskDecomposer, TaskExtractor, TemplateFlowchart,
};
use crate::config::{Config, FlowchartMode};
use crate::llm::create_client;
use crate::prompts::PromptLoader;

/// A stage failure, tagged with the stage that raised it
#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct PipelineError {
    pub stage: &'static str,
    #[source]
    pub source: StageError,
}

/// The four-stage planning pipeline
pub struct Planner {
    extractor: Arc<ExtractStage>,
    decomposer: Arc<DecomposeStage>,
    evaluator: Arc<EvaluateStage>,
    flowchart: Arc<FlowchartStage>,
}

impl Planner {
    /// Assemble a planner from explicit stages
    pub fn new(
        extractor: Arc<ExtractStage>,
        decomposer: Arc<DecomposeStage>,
        evaluator: Arc<EvaluateStage>,
        flowchart: Arc<FlowchartStage>,
    ) -> Self {
        Self {
            extractor,
            decomposer,
            evaluator,
            flowchart,
        }
    }

    /// Build every stage from configuration
    ///
    /// Each LLM-backed stage gets its own client bound to its own model.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        info!(provider = %config.llm.provider, "Building planner");

        let prompts = Arc::new(PromptLoader::new(&config.prompts.dir));
        let stages = &config.stages;

        let extractor_llm = create_client(&config.llm.resolve(&stages.extractor)).context("extractor client")?;
        let decomposer_llm = create_client(&config.llm.resolve(&stages.decomposer)).context("decomposer client")?;
        let evaluator_llm = create_client(&config.llm.resolve(&stages.evaluator)).context("evaluator client")?;

        let flowchart: Arc<FlowchartStage> = match stages.flowchart.mode {
            FlowchartMode::Llm => {
                let llm = create_client(&config.llm.resolve(&stages.flowchart.stage())).context("flowchart client")?;
                Arc::new(LlmFlowchart::new(llm, prompts.clone(), stages.flowchart.max_tokens))
            }
            FlowchartMode::Template => Arc::new(TemplateFlowchart),
        };

        Ok(Self::new(
            Arc::new(TaskExtractor::new(
                extractor_llm,
                prompts.clone(),
                stages.extractor.max_tokens,
            )),
            Arc::new(SubtaskDecomposer::new(
                decomposer_llm,
                prompts.clone(),
                stages.decomposer.max_tokens,
                config.decomposition,
            )),
            Arc::new(PlanEvaluator::new(evaluator_llm, prompts, stages.evaluator.max_tokens)),
            flowchart,
        ))
    }

    /// Run the full pipeline on one user request
    pub async fn plan(&self, user_input: &str) -> Result<PlanResult, PipelineError> {
        let run_id = uuid::Uuid::now_v7();
        let span = info_span!("plan", %run_id);
        self.run_stages(user_input).instrument(span).await
    }

    async fn run_stages(&self, user_input: &str) -> Result<PlanResult, PipelineError> {
        info!(input_len = user_input.len(), "Planning started");

        let task = run_stage(self.extractor.as_ref(), user_input.to_string()).await?;
        let decomposition = run_stage(self.decomposer.as_ref(), task.clone()).await?;
        let evaluation: PlanEvaluation = run_stage(self.evaluator.as_ref(), decomposition.subtasks.clone()).await?;
        let diagram = run_stage(
            self.flowchart.as_ref(),
            FlowchartInput {
                subtasks: decomposition.subtasks.clone(),
                evaluation: evaluation.clone(),
            },
        )
        .await?;

        info!(
            subtask_count = decomposition.subtasks.len(),
            ready = evaluation.ready,
            stop = %decomposition.stop,
            "Planning finished"
        );

        Ok(PlanResult {
            task,
            subtasks: decomposition.subtasks,
            ready: evaluation.ready,
            suggestions: evaluation.suggestions,
            stop: decomposition.stop,
            diagram,
        })
    }
}

async fn run_stage<S>(stage: &S, input: S::Input) -> Result<S::Output, PipelineError>
where
    S: Stage + ?Sized,
{
    let name = stage.name();
    let started = Instant::now();
    info!(stage = name, "Stage started");

    let output = stage
        .run(input)
        .await
        .map_err(|source| PipelineError { stage: name, source })?;

    info!(stage = name, elapsed_ms = started.elapsed().as_millis() as u64, "Stage finished");
    Ok(output)
}
