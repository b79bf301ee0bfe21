//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Values available to every stage template
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Number of subtasks under review (evaluator)
    pub subtask_count: usize,
    /// Evaluator suggestions when the plan was not ready (flowchart)
    pub suggestions: Option<String>,
}

/// Where a template was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Override(PathBuf),
    Embedded,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `.taskplanner/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers `{dir}/{name}.pmt` when present
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            hbs: Self::engine(),
            override_dir: if dir.is_dir() { Some(dir.to_path_buf()) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle quotes in suggestions
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Names of the templates the pipeline uses
    pub fn names(&self) -> &'static [&'static str] {
        embedded::NAMES
    }

    fn override_path(&self, name: &str) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.pmt", name)))
            .filter(|path| path.exists())
    }

    /// Report where `name` would be loaded from
    pub fn source(&self, name: &str) -> Option<PromptSource> {
        if let Some(path) = self.override_path(name) {
            return Some(PromptSource::Override(path));
        }
        embedded::get_embedded(name).map(|_| PromptSource::Embedded)
    }

    /// Load a raw template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        if let Some(path) = self.override_path(name) {
            debug!("Loading prompt from override: {:?}", path);
            return std::fs::read_to_string(&path)
                .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        let template = self.load_template(template_name)?;
        debug!(%template_name, ?context, "render: called");

        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embedded_without_suggestions() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render("flowchart", &PromptContext::default()).unwrap();
        assert!(prompt.contains("digraph"));
        assert!(!prompt.contains("reviewer"));
    }

    #[test]
    fn test_render_includes_suggestions_unescaped() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext {
            subtask_count: 2,
            suggestions: Some("Add \"catering\" & music".to_string()),
        };
        let prompt = loader.render("flowchart", &ctx).unwrap();
        assert!(prompt.contains("Add \"catering\" & music"));
    }

    #[test]
    fn test_render_subtask_count() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext {
            subtask_count: 3,
            ..Default::default()
        };
        let prompt = loader.render("evaluator", &ctx).unwrap();
        assert!(prompt.contains("(3 in total)"));
    }

    #[test]
    fn test_override_directory_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("decomposer.pmt"), "Split it. Budget: {{subtask_count}}").unwrap();

        let loader = PromptLoader::new(dir.path());
        assert_eq!(
            loader.source("decomposer"),
            Some(PromptSource::Override(dir.path().join("decomposer.pmt")))
        );
        assert_eq!(loader.source("evaluator"), Some(PromptSource::Embedded));

        let prompt = loader.render("decomposer", &PromptContext::default()).unwrap();
        assert_eq!(prompt, "Split it. Budget: 0");
    }

    #[test]
    fn test_missing_override_dir_falls_back() {
        let loader = PromptLoader::new("/definitely/not/a/prompt/dir");
        assert_eq!(loader.source("extractor"), Some(PromptSource::Embedded));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
        assert!(loader.source("nonexistent-template").is_none());
    }
}
