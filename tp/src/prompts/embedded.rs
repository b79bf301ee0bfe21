//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Primary task extraction prompt
pub const EXTRACTOR: &str = include_str!("../../prompts/extractor.pmt");

/// Single-step decomposition prompt
pub const DECOMPOSER: &str = include_str!("../../prompts/decomposer.pmt");

/// Plan evaluation prompt
pub const EVALUATOR: &str = include_str!("../../prompts/evaluator.pmt");

/// DOT flowchart prompt
pub const FLOWCHART: &str = include_str!("../../prompts/flowchart.pmt");

/// Names of every embedded prompt, in pipeline order
pub const NAMES: &[&str] = &["extractor", "decomposer", "evaluator", "flowchart"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "extractor" => Some(EXTRACTOR),
        "decomposer" => Some(DECOMPOSER),
        "evaluator" => Some(EVALUATOR),
        "flowchart" => Some(FLOWCHART),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
