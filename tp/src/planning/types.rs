//! Plan data model

use std::fmt;

use serde::Serialize;

/// A goal or subtask; opaque text
pub type Task = String;

/// Ordered subtasks, unique by exact string equality
///
/// Insertion order is discovery order. Entries are never reordered or
/// normalized, so "Book venue" and "Book venue." are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubtaskList(Vec<Task>);

impl SubtaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.0.iter().any(|t| t == task)
    }

    /// Append `task` unless an identical entry exists; returns whether it was added
    pub fn push_novel(&mut self, task: impl Into<Task>) -> bool {
        let task = task.into();
        if self.contains(&task) {
            return false;
        }
        self.0.push(task);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.0
    }

    /// Newline-joined form handed to the evaluator and flowchart prompts
    pub fn joined(&self) -> String {
        self.0.join("\n")
    }
}

impl<T: Into<Task>> FromIterator<T> for SubtaskList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = SubtaskList::new();
        for task in iter {
            list.push_novel(task);
        }
        list
    }
}

impl<'a> IntoIterator for &'a SubtaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Why the decomposition loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopCondition {
    /// The collaborator returned an empty subtask
    Exhausted,
    /// The collaborator returned a subtask already in the list
    Repeated,
    /// The iteration bound was reached before convergence
    IterationLimit,
    /// The wall-clock budget ran out before convergence
    Deadline,
}

impl StopCondition {
    /// True when the loop stopped on its own rather than on a bound
    pub fn is_converged(&self) -> bool {
        matches!(self, StopCondition::Exhausted | StopCondition::Repeated)
    }
}

impl fmt::Display for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopCondition::Exhausted => "converged (no further subtask)",
            StopCondition::Repeated => "converged (repeated subtask)",
            StopCondition::IterationLimit => "stopped at iteration limit",
            StopCondition::Deadline => "stopped at time limit",
        };
        write!(f, "{}", s)
    }
}

/// Output of the decomposer stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub subtasks: SubtaskList,
    pub stop: StopCondition,
    /// Collaborator calls made
    pub iterations: u32,
}

/// Readiness verdict plus optional refinements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanEvaluation {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

impl PlanEvaluation {
    pub fn ready() -> Self {
        Self {
            ready: true,
            suggestions: None,
        }
    }
}

/// Directed-graph description (Graphviz DOT)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Flowchart(String);

impl Flowchart {
    pub fn new(dot: impl Into<String>) -> Self {
        Self(dot.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Flowchart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to the flowchart stage
#[derive(Debug, Clone, Default)]
pub struct FlowchartInput {
    pub subtasks: SubtaskList,
    pub evaluation: PlanEvaluation,
}

/// Composite pipeline output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanResult {
    /// Goal produced by the extractor
    pub task: Task,
    pub subtasks: SubtaskList,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    pub stop: StopCondition,
    pub diagram: Flowchart,
}
