//! TaskPlanner - LLM-backed task planning pipeline
//!
//! TaskPlanner turns a free-form request into a structured plan. A request
//! goes through four stages, each backed by a language-model collaborator:
//!
//! 1. **Extract** a concise goal from the request
//! 2. **Decompose** the goal into subtasks, one model call per subtask, until
//!    the model has nothing new to add or a bound is reached
//! 3. **Evaluate** whether the subtask list is ready or needs improvement
//! 4. **Draw** the plan as a Graphviz DOT flowchart
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with OpenAI-compatible and Anthropic implementations
//! - [`planning`] - The four stages and the [`Planner`] that sequences them
//! - [`prompts`] - Embedded prompt templates with on-disk overrides
//! - [`render`] - External DOT renderer
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod render;

// Re-export commonly used types
pub use config::{Config, DecompositionConfig, FlowchartMode, LlmConfig};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client,
};
pub use planning::{
    Decomposition, Flowchart, PipelineError, PlanEvaluation, PlanResult, Planner, StopCondition, SubtaskList, Task,
};
pub use prompts::PromptLoader;
pub use render::{DotRenderer, GraphRenderer, RenderError};
