//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TaskPlanner - turn a free-form request into a reviewed, diagrammed plan
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Extract a goal, decompose it into subtasks, evaluate the plan and draw it",
    version,
    after_help = "Logs are written to: ~/.local/share/taskplanner/logs/taskplanner.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Plan a task: extract, decompose, evaluate, draw
    Plan {
        /// Task description; read from stdin when omitted or "-"
        #[arg(value_name = "TASK")]
        task: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Render the flowchart to this file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Maximum decomposition iterations
        #[arg(short = 'n', long)]
        max_iterations: Option<u32>,

        /// Build the flowchart locally instead of asking the model
        #[arg(long)]
        template: bool,
    },

    /// Print the effective configuration as YAML
    ShowConfig,

    /// List prompt templates, or print one
    Prompts {
        /// Template name (extractor, decomposer, evaluator, flowchart)
        name: Option<String>,
    },
}

/// Output format for the plan command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskplanner")
        .join("logs")
        .join("taskplanner.log")
}
