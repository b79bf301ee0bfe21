//! Flowchart stages - subtask list to Graphviz DOT
//!
//! Two implementations: `LlmFlowchart` asks the collaborator for DOT text and
//! passes it through unvalidated; `TemplateFlowchart` builds a sequential
//! chain locally. Invalid DOT only surfaces when a renderer rejects it.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::stage::log_reply;
use super::{Flowchart, FlowchartInput, Stage, StageError, SubtaskList};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};

/// Remove one surrounding Markdown code fence, if present
///
/// Only the fence lines are dropped; the body is returned untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```dot, ```graphviz, ...)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return trimmed,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Asks the collaborator for the DOT description
pub struct LlmFlowchart {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl LlmFlowchart {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    pub async fn generate(&self, input: &FlowchartInput) -> Result<Flowchart, StageError> {
        debug!(subtask_count = input.subtasks.len(), "generate: called");
        let context = PromptContext {
            subtask_count: input.subtasks.len(),
            suggestions: input.evaluation.suggestions.clone(),
        };
        let system_prompt = self.prompts.render("flowchart", &context).map_err(StageError::prompt)?;

        let request = CompletionRequest::single(
            system_prompt,
            format!("Subtasks:\n{}", input.subtasks.joined()),
            self.max_tokens,
        );
        let response = self.llm.complete(request).await?;
        log_reply("flowchart", self.llm.model(), &response);
        let text = response.trimmed_text();
        let dot = strip_code_fence(&text);

        info!(
            model = %self.llm.model(),
            dot_len = dot.len(),
            tokens = response.usage.total(),
            "Flowchart generated"
        );
        Ok(Flowchart::new(dot))
    }
}

#[async_trait]
impl Stage for LlmFlowchart {
    type Input = FlowchartInput;
    type Output = Flowchart;

    fn name(&self) -> &'static str {
        "flowchart"
    }

    async fn run(&self, input: FlowchartInput) -> Result<Flowchart, StageError> {
        self.generate(&input).await
    }
}

/// Builds a top-to-bottom chain, one node per subtask, without a collaborator
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateFlowchart;

impl TemplateFlowchart {
    pub fn build(subtasks: &SubtaskList) -> Flowchart {
        debug!(subtask_count = subtasks.len(), "TemplateFlowchart::build: called");
        let mut dot = String::from("digraph plan {\n    rankdir=TB;\n    node [shape=box, style=rounded];\n");

        for (idx, task) in subtasks.iter().enumerate() {
            let _ = writeln!(dot, "    n{} [label=\"{}\"];", idx, escape_label(task));
        }
        for idx in 1..subtasks.len() {
            let _ = writeln!(dot, "    n{} -> n{};", idx - 1, idx);
        }

        dot.push('}');
        Flowchart::new(dot)
    }
}

#[async_trait]
impl Stage for TemplateFlowchart {
    type Input = FlowchartInput;
    type Output = Flowchart;

    fn name(&self) -> &'static str {
        "flowchart"
    }

    async fn run(&self, input: FlowchartInput) -> Result<Flowchart, StageError> {
        Ok(Self::build(&input.subtasks))
    }
}

/// Escape a DOT double-quoted string
fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::planning::PlanEvaluation;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```dot\ndigraph { a -> b }\n```"), "digraph { a -> b }");
        assert_eq!(strip_code_fence("```\ndigraph {}\n```\n"), "digraph {}");
        assert_eq!(strip_code_fence("  digraph {}  "), "digraph {}");
        // unterminated fence: keep the body
        assert_eq!(strip_code_fence("```dot\ndigraph {}"), "digraph {}");
    }

    #[test]
    fn test_template_chain() {
        let subtasks: SubtaskList = ["venue", "invites", "cake"].into_iter().collect();
        let dot = TemplateFlowchart::build(&subtasks);

        assert!(dot.as_str().starts_with("digraph plan {"));
        assert!(dot.as_str().contains("n0 [label=\"venue\"];"));
        assert!(dot.as_str().contains("n0 -> n1;"));
        assert!(dot.as_str().contains("n1 -> n2;"));
        assert!(!dot.as_str().contains("n2 -> "));
        assert!(dot.as_str().ends_with('}'));
    }

    #[test]
    fn test_template_escapes_labels() {
        let subtasks: SubtaskList = ["Print \"Welcome\" banner"].into_iter().collect();
        let dot = TemplateFlowchart::build(&subtasks);
        assert!(dot.as_str().contains(r#"label="Print \"Welcome\" banner""#));
    }

    #[test]
    fn test_template_empty_list() {
        let dot = TemplateFlowchart::build(&SubtaskList::new());
        assert!(!dot.as_str().contains("->"));
        assert!(!dot.as_str().contains("label"));
    }

    #[tokio::test]
    async fn test_llm_flowchart_passes_reply_through() {
        let mock = Arc::new(MockLlmClient::new(vec!["```dot\ndigraph { venue -> invites }\n```"]));
        let stage = LlmFlowchart::new(mock.clone(), Arc::new(PromptLoader::embedded_only()), 1024);

        let input = FlowchartInput {
            subtasks: ["venue", "invites"].into_iter().collect(),
            evaluation: PlanEvaluation {
                ready: false,
                suggestions: Some("Needs improvement: add catering".to_string()),
            },
        };
        let dot = stage.run(input).await.unwrap();
        assert_eq!(dot.as_str(), "digraph { venue -> invites }");

        let request = &mock.requests()[0];
        assert_eq!(request.last_user_text(), Some("Subtasks:\nvenue\ninvites"));
        assert!(request.system_prompt.contains("add catering"));
    }

    #[tokio::test]
    async fn test_llm_flowchart_does_not_validate() {
        let mock = Arc::new(MockLlmClient::new(vec!["this is not DOT"]));
        let stage = LlmFlowchart::new(mock, Arc::new(PromptLoader::embedded_only()), 1024);
        let dot = stage.run(FlowchartInput::default()).await.unwrap();
        assert_eq!(dot.as_str(), "this is not DOT");
    }
}
