//! Step functions: the behaviours behind each workflow node.
//!
//! Every step is a pure transformation of the turn's [`WorkflowState`]. The
//! keyword tables and canned texts they consult are compile-time constants.

pub mod analyze;
pub mod general;
pub mod metrics;
pub mod router;
pub mod search;
pub mod workflow;

use agentwire_core::error::Result;

use crate::state::WorkflowState;

pub use analyze::AnalyzeContent;
pub use general::GeneralResponse;
pub use metrics::CalculateMetrics;
pub use router::Router;
pub use search::SearchKnowledge;
pub use workflow::ProcessWorkflow;

pub const ROUTER: &str = "router";
pub const ANALYZE_CONTENT: &str = "analyze_content";
pub const SEARCH_KNOWLEDGE: &str = "search_knowledge";
pub const CALCULATE_METRICS: &str = "calculate_metrics";
pub const PROCESS_WORKFLOW: &str = "process_workflow";
pub const GENERAL_RESPONSE: &str = "general_response";
/// Emitted by the router for an empty message. No edge carries it.
pub const CLARIFY: &str = "clarify";

/// One unit of workflow execution.
pub trait Step: Send + Sync + 'static {
    /// Node name this step registers under.
    fn name(&self) -> &str;

    /// Transform the state. Errors end the turn.
    fn run(&self, state: WorkflowState) -> Result<WorkflowState>;
}

/// Whether `text` contains any of `words` as a substring.
pub(crate) fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// `"insight_generation"` → `"Insight Generation"`.
pub fn title_case(label: &str) -> String {
    label
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
