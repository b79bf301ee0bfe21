//! Planning module - the four-stage planning pipeline
//!
//! ```text
//! user input → TaskExtractor → goal → SubtaskDecomposer → subtasks
//!                                                            │
//!                         Flowchart ← PlanEvaluator ←────────┘
//!                             ↓
//!                         PlanResult
//! ```
//!
//! Every stage implements [`Stage`]; [`Planner`] runs them in order and
//! threads each output into the next input.

mod decomposer;
mod evaluator;
mod extractor;
mod flowchart;
mod pipeline;
mod stage;
mod types;

pub use decomposer::SubtaskDecomposer;
pub use evaluator::{PlanEvaluator, classify};
pub use extractor::TaskExtractor;
pub use flowchart::{LlmFlowchart, TemplateFlowchart, strip_code_fence};
pub use pipeline::{PipelineError, Planner};
pub use stage::{DecomposeStage, EvaluateStage, ExtractStage, FlowchartStage, Stage, StageError};
pub use types::{
    Decomposition, Flowchart, FlowchartInput, PlanEvaluation, PlanResult, StopCondition, SubtaskList, Task,
};
