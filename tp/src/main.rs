//! TaskPlanner - turn a free-form request into a reviewed, diagrammed plan
//!
//! CLI entry point for the planning pipeline.

use std::fs;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use taskplanner::cli::{Cli, Command, OutputFormat, get_log_path};
use taskplanner::config::{Config, FlowchartMode};
use taskplanner::planning::{PlanResult, Planner};
use taskplanner::prompts::{PromptLoader, PromptSource};
use taskplanner::render::{DotRenderer, GraphRenderer};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Logs go to the file only; stdout carries the plan
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, "TaskPlanner loaded config");

    match cli.command {
        Command::Plan {
            task,
            format,
            output,
            max_iterations,
            template,
        } => cmd_plan(config, task, format, output, max_iterations, template).await,
        Command::ShowConfig => cmd_show_config(&config),
        Command::Prompts { name } => cmd_prompts(&config, name.as_deref()),
    }
}

/// Read the request from the task words, or stdin for `-` / no words
fn read_task(words: Vec<String>) -> Result<String> {
    let from_stdin = words.is_empty() || (words.len() == 1 && words[0] == "-");
    if !from_stdin {
        return Ok(words.join(" "));
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).context("Failed to read task from stdin")?;
    Ok(buf)
}

/// Run the planning pipeline
async fn cmd_plan(
    mut config: Config,
    words: Vec<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
    max_iterations: Option<u32>,
    template: bool,
) -> Result<()> {
    let task = read_task(words)?;
    let task = task.trim();
    if task.is_empty() {
        eprintln!("{}", "Please enter a valid task".yellow());
        warn!("Empty task input");
        eyre::bail!("Please enter a valid task");
    }

    if let Some(n) = max_iterations {
        config.decomposition.max_iterations = n;
    }
    if template {
        config.stages.flowchart.mode = FlowchartMode::Template;
    }

    let config = Arc::new(config);
    let planner = Planner::from_config(config.clone())?;
    let result = planner.plan(task).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_plan(&result),
    }

    if let Some(path) = output {
        render_to_file(&DotRenderer::from_config(&config.render), &result, &path).await?;
        if format == OutputFormat::Text {
            println!();
            println!("Flowchart rendered to {}", path.display().to_string().cyan());
        }
    }

    Ok(())
}

fn print_plan(result: &PlanResult) {
    println!("{} {}", "Task:".bold(), result.task);
    println!();

    println!("{}", "Subtasks:".bold());
    if result.subtasks.is_empty() {
        println!("  (none)");
    }
    for (idx, subtask) in result.subtasks.iter().enumerate() {
        println!("  {:>2}. {}", idx + 1, subtask);
    }
    if !result.stop.is_converged() {
        println!("  {}", format!("({})", result.stop).yellow());
    }
    println!();

    if result.ready {
        println!("{} {}", "Evaluation:".bold(), "ready".green());
    } else {
        println!("{} {}", "Evaluation:".bold(), "needs improvement".yellow());
        if let Some(suggestions) = &result.suggestions {
            for line in suggestions.lines() {
                println!("  {}", line);
            }
        }
    }
    println!();

    println!("{}", "Flowchart:".bold());
    println!("{}", result.diagram);
}

async fn render_to_file(renderer: &dyn GraphRenderer, result: &PlanResult, path: &Path) -> Result<()> {
    let bytes = renderer
        .render(&result.diagram)
        .await
        .context("Failed to render flowchart")?;
    fs::write(path, bytes).context(format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Flowchart rendered");
    Ok(())
}

/// Print the effective configuration
fn cmd_show_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

/// List prompt templates or print one
fn cmd_prompts(config: &Config, name: Option<&str>) -> Result<()> {
    let loader = PromptLoader::new(&config.prompts.dir);

    if let Some(name) = name {
        let template = loader.load_template(name)?;
        println!("{}", template);
        return Ok(());
    }

    println!("Prompt templates:");
    for name in loader.names() {
        let source = match loader.source(name) {
            Some(PromptSource::Override(path)) => path.display().to_string(),
            Some(PromptSource::Embedded) => "embedded".to_string(),
            None => "missing".red().to_string(),
        };
        println!("  {:12} {}", name.yellow(), source);
    }
    Ok(())
}
