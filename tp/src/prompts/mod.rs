//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files, one per pipeline stage.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override, default `.taskplanner/prompts/`)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader, PromptSource};
