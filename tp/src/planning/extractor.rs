//! TaskExtractor - condenses raw user input into one primary goal

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::stage::log_reply;
use super::{Stage, StageError, Task};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};

/// Single collaborator call; no retry, no validation of the reply
pub struct TaskExtractor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl TaskExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Extract the primary goal
    ///
    /// An empty reply comes back as an empty goal; it is not treated as an error.
    pub async fn extract(&self, user_input: &str) -> Result<Task, StageError> {
        debug!(input_len = user_input.len(), "extract: called");
        let system_prompt = self
            .prompts
            .render("extractor", &PromptContext::default())
            .map_err(StageError::prompt)?;

        let request = CompletionRequest::single(system_prompt, format!("User request: {}", user_input), self.max_tokens);
        let response = self.llm.complete(request).await?;
        log_reply("extractor", self.llm.model(), &response);
        let goal = response.trimmed_text();

        info!(model = %self.llm.model(), %goal, tokens = response.usage.total(), "Extracted primary task");
        Ok(goal)
    }
}

#[async_trait]
impl Stage for TaskExtractor {
    type Input = String;
    type Output = Task;

    fn name(&self) -> &'static str {
        "extractor"
    }

    async fn run(&self, input: String) -> Result<Task, StageError> {
        self.extract(&input).await
    }
}
