//! SubtaskDecomposer - iterative LLM-driven decomposition of a goal
//!
//! Repeatedly asks the collaborator to break the current focus down one step
//! further, feeding each new subtask back in as the next focus, until the
//! collaborator stops producing new distinct subtasks.
//!
//! # Termination
//!
//! ```text
//! focus = goal
//! loop:
//!     iterations == max-iterations  → IterationLimit
//!     deadline passed mid-call      → Deadline
//!     candidate empty               → Exhausted
//!     candidate already in list     → Repeated
//!     otherwise push, focus = candidate
//! ```
//!
//! Exact string identity is the convergence test. Paraphrases and trailing
//! punctuation count as new subtasks, so a collaborator that keeps inventing
//! fresh wording only stops at one of the two bounds.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::stage::log_reply;
use super::{Decomposition, Stage, StageError, StopCondition, SubtaskList, Task};
use crate::config::DecompositionConfig;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};

/// SubtaskDecomposer expands a goal into an ordered subtask list
pub struct SubtaskDecomposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
    bounds: DecompositionConfig,
}

impl SubtaskDecomposer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        max_tokens: u32,
        bounds: DecompositionConfig,
    ) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
            bounds,
        }
    }

    /// Decompose `task` until convergence or a bound trips
    ///
    /// Bounds return the subtasks gathered so far; a collaborator failure
    /// discards them and returns the error.
    pub async fn decompose(&self, task: &str) -> Result<Decomposition, StageError> {
        info!(
            %task,
            max_iterations = self.bounds.max_iterations,
            timeout_ms = self.bounds.timeout_ms,
            "Decomposing task"
        );

        let system_prompt = self
            .prompts
            .render("decomposer", &PromptContext::default())
            .map_err(StageError::prompt)?;
        let deadline = Instant::now() + self.bounds.timeout();

        let mut subtasks = SubtaskList::new();
        let mut focus: Task = task.to_string();
        let mut iterations = 0u32;

        let stop = loop {
            if iterations >= self.bounds.max_iterations {
                break StopCondition::IterationLimit;
            }
            iterations += 1;

            let candidate = match tokio::time::timeout_at(deadline, self.next_subtask(&system_prompt, &focus)).await {
                Ok(result) => result?,
                Err(_) => break StopCondition::Deadline,
            };
            debug!(iterations, %candidate, "decompose: candidate received");

            if candidate.is_empty() {
                break StopCondition::Exhausted;
            }
            if !subtasks.push_novel(candidate.clone()) {
                break StopCondition::Repeated;
            }
            focus = candidate;
        };

        if stop.is_converged() {
            info!(iterations, subtask_count = subtasks.len(), %stop, "Decomposition converged");
        } else {
            warn!(
                iterations,
                subtask_count = subtasks.len(),
                %stop,
                "Decomposition did not converge, returning partial subtask list"
            );
        }

        Ok(Decomposition {
            subtasks,
            stop,
            iterations,
        })
    }

    /// One collaborator call for the next subtask of `focus`
    async fn next_subtask(&self, system_prompt: &str, focus: &str) -> Result<Task, StageError> {
        debug!(%focus, "next_subtask: called");
        let request = CompletionRequest::single(system_prompt, format!("Task: {}", focus), self.max_tokens);
        let response = self.llm.complete(request).await?;
        log_reply("decomposer", self.llm.model(), &response);
        Ok(response.trimmed_text())
    }
}

#[async_trait]
impl Stage for SubtaskDecomposer {
    type Input = Task;
    type Output = Decomposition;

    fn name(&self) -> &'static str {
        "decomposer"
    }

    async fn run(&self, input: Task) -> Result<Decomposition, StageError> {
        self.decompose(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError};
    use std::time::Duration;

    fn bounds(max_iterations: u32) -> DecompositionConfig {
        DecompositionConfig {
            max_iterations,
            timeout_ms: 60_000,
        }
    }

    fn decomposer(llm: Arc<dyn LlmClient>, bounds: DecompositionConfig) -> SubtaskDecomposer {
        SubtaskDecomposer::new(llm, Arc::new(PromptLoader::embedded_only()), 150, bounds)
    }

    #[tokio::test]
    async fn test_countdown_converges() {
        let mock = Arc::new(MockLlmClient::new(vec!["step3", "step2", "step1", ""]));
        let result = decomposer(mock.clone(), bounds(25)).decompose("countdown").await.unwrap();

        assert_eq!(result.subtasks.as_slice(), &["step3", "step2", "step1"]);
        assert_eq!(result.stop, StopCondition::Exhausted);
        assert_eq!(result.iterations, 4);
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn test_each_call_focuses_on_previous_subtask() {
        let mock = Arc::new(MockLlmClient::new(vec!["Choose a venue", "Call three venues", ""]));
        decomposer(mock.clone(), bounds(25))
            .decompose("Plan a birthday party")
            .await
            .unwrap();

        let prompts: Vec<String> = mock
            .requests()
            .iter()
            .filter_map(|r| r.last_user_text().map(String::from))
            .collect();
        assert_eq!(
            prompts,
            vec![
                "Task: Plan a birthday party",
                "Task: Choose a venue",
                "Task: Call three venues"
            ]
        );
    }

    #[tokio::test]
    async fn test_echoing_collaborator_yields_single_subtask() {
        let mock = Arc::new(MockLlmClient::with_responder(|_, req| {
            Ok(req.last_user_text().unwrap_or_default().trim_start_matches("Task: ").to_string())
        }));
        let result = decomposer(mock.clone(), bounds(25)).decompose("Plan a party").await.unwrap();

        assert_eq!(result.subtasks.as_slice(), &["Plan a party"]);
        assert_eq!(result.stop, StopCondition::Repeated);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_first_reply_yields_empty_list() {
        let mock = Arc::new(MockLlmClient::new(vec!["  \n"]));
        let result = decomposer(mock, bounds(25)).decompose("Already atomic").await.unwrap();

        assert!(result.subtasks.is_empty());
        assert_eq!(result.stop, StopCondition::Exhausted);
    }

    #[tokio::test]
    async fn test_cycle_back_to_earlier_subtask_stops() {
        let mock = Arc::new(MockLlmClient::new(vec!["a", "b", "a", "never reached"]));
        let result = decomposer(mock.clone(), bounds(25)).decompose("root").await.unwrap();

        assert_eq!(result.subtasks.as_slice(), &["a", "b"]);
        assert_eq!(result.stop, StopCondition::Repeated);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_always_novel_collaborator_hits_iteration_limit() {
        let mock = Arc::new(MockLlmClient::with_responder(|idx, _| Ok(format!("fresh idea #{}", idx))));
        let result = decomposer(mock.clone(), bounds(7)).decompose("infinite").await.unwrap();

        assert_eq!(result.stop, StopCondition::IterationLimit);
        assert_eq!(result.subtasks.len(), 7);
        assert_eq!(result.iterations, 7);
        assert_eq!(mock.call_count(), 7);
    }

    #[tokio::test]
    async fn test_near_duplicates_do_not_converge() {
        let mock = Arc::new(MockLlmClient::with_responder(|idx, _| {
            Ok(format!("Book the venue{}", ".".repeat(idx)))
        }));
        let result = decomposer(mock, bounds(4)).decompose("party").await.unwrap();

        assert_eq!(result.stop, StopCondition::IterationLimit);
        assert_eq!(result.subtasks.len(), 4);
    }

    #[tokio::test]
    async fn test_collaborator_failure_aborts() {
        let mock = Arc::new(MockLlmClient::with_responder(|idx, _| {
            if idx < 2 {
                Ok(format!("step {}", idx))
            } else {
                Err(LlmError::RateLimited {
                    retry_after: Duration::from_secs(30),
                })
            }
        }));
        let err = decomposer(mock, bounds(25)).decompose("root").await.unwrap_err();
        assert!(matches!(err, StageError::Llm(LlmError::RateLimited { .. })));
    }

    /// Collaborator that takes 50ms per call and never converges
    struct SlowNovelLlm;

    #[async_trait]
    impl LlmClient for SlowNovelLlm {
        fn model(&self) -> &str {
            "slow"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(CompletionResponse::text(format!("deeper than {}", request.last_user_text().unwrap_or_default())))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_in_flight_call() {
        let bounds = DecompositionConfig {
            max_iterations: 100,
            timeout_ms: 120,
        };
        let result = decomposer(Arc::new(SlowNovelLlm), bounds).decompose("root").await.unwrap();

        // calls finish at 50ms and 100ms; the third is cut off at 120ms
        assert_eq!(result.stop, StopCondition::Deadline);
        assert_eq!(result.subtasks.len(), 2);
        assert_eq!(result.iterations, 3);
    }
}
