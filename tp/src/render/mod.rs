//! Graph rendering collaborator
//!
//! Turns a DOT description into a displayable artifact by piping it through
//! an external Graphviz-compatible command. The description is not checked
//! beforehand; a malformed graph fails here, at the boundary.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::RenderConfig;
use crate::planning::Flowchart;

/// Errors from the rendering collaborator
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start renderer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer rejected the graph (exit code {code}): {stderr}")]
    Rejected { code: i32, stderr: String },

    #[error("Renderer timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a graph description into artifact bytes
#[async_trait]
pub trait GraphRenderer: Send + Sync {
    async fn render(&self, graph: &Flowchart) -> Result<Vec<u8>, RenderError>;
}

/// Pipes DOT into `dot -T<format>` (or any command with the same contract)
#[derive(Debug, Clone)]
pub struct DotRenderer {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl DotRenderer {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Output format taken from a `-T<format>` argument, defaulting to svg
    pub fn output_format(&self) -> &str {
        self.args
            .iter()
            .find_map(|a| a.strip_prefix("-T"))
            .and_then(|f| f.split(':').next())
            .filter(|f| !f.is_empty())
            .unwrap_or("svg")
    }
}

#[async_trait]
impl GraphRenderer for DotRenderer {
    async fn render(&self, graph: &Flowchart) -> Result<Vec<u8>, RenderError> {
        debug!(command = %self.command, args = ?self.args, "render: called");
        let mut child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feed stdin from a separate task so a large graph cannot deadlock against stdout
        if let Some(mut stdin) = child.stdin.take() {
            let input = graph.as_str().as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "render: stdin write failed");
                }
            });
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                debug!("render: timed out");
                return Err(RenderError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(exit_code = ?output.status.code(), "render: command failed");
            return Err(RenderError::Rejected {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        debug!(bytes = output.stdout.len(), "render: success");
        Ok(output.stdout)
    }
}
