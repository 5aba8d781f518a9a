use tracing::debug;

use agentwire_core::error::Result;

use super::{
    contains_any, Step, ANALYZE_CONTENT, CALCULATE_METRICS, CLARIFY, GENERAL_RESPONSE,
    PROCESS_WORKFLOW, ROUTER, SEARCH_KNOWLEDGE,
};
use crate::state::WorkflowState;

/// Keyword triggers in priority order. The first category with a hit wins.
const ROUTES: &[(&str, &[&str])] = &[
    (ANALYZE_CONTENT, &["analyze", "analysis", "sentiment", "keywords"]),
    (SEARCH_KNOWLEDGE, &["search", "find", "knowledge", "information"]),
    (CALCULATE_METRICS, &["calculate", "metrics", "numbers", "data"]),
    (PROCESS_WORKFLOW, &["workflow", "process", "step", "procedure"]),
];

/// Classify a message into an action label.
pub fn classify(text: &str) -> &'static str {
    if text.trim().is_empty() {
        return CLARIFY;
    }
    let lowered = text.to_lowercase();
    ROUTES
        .iter()
        .find(|(_, words)| contains_any(&lowered, words))
        .map(|(label, _)| *label)
        .unwrap_or(GENERAL_RESPONSE)
}

/// Entry node: picks the action node for the latest message.
pub struct Router;

impl Step for Router {
    fn name(&self) -> &str {
        ROUTER
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let label = classify(state.latest_user_text());
        debug!(session_id = %state.session_id, label, "Routed message");
        state.next_action = Some(label.to_string());
        state.current_step = "routing_completed".to_string();
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentwire_core::types::SessionId;

    #[test]
    fn single_category_messages() {
        assert_eq!(classify("What is the sentiment here?"), ANALYZE_CONTENT);
        assert_eq!(classify("Search for machine learning"), SEARCH_KNOWLEDGE);
        assert_eq!(classify("Calculate 1, 2, 3"), CALCULATE_METRICS);
        assert_eq!(classify("Help me with a WORKFLOW"), PROCESS_WORKFLOW);
        assert_eq!(classify("Hello there"), GENERAL_RESPONSE);
    }

    #[test]
    fn earlier_category_wins_on_overlap() {
        // "data" is a metrics trigger, but analysis is checked first.
        assert_eq!(classify("analyze this data"), ANALYZE_CONTENT);
        assert_eq!(classify("find the data"), SEARCH_KNOWLEDGE);
        assert_eq!(classify("process these numbers"), CALCULATE_METRICS);
        assert_eq!(classify("search the analysis workflow"), ANALYZE_CONTENT);
    }

    #[test]
    fn blank_message_asks_for_clarification() {
        assert_eq!(classify(""), CLARIFY);
        assert_eq!(classify("   \n"), CLARIFY);
    }

    #[test]
    fn router_sets_label_without_touching_results() {
        let state = WorkflowState::new(SessionId::from_string("s"), "analyze this");
        let out = Router.run(state).unwrap();
        assert_eq!(out.next_action.as_deref(), Some(ANALYZE_CONTENT));
        assert_eq!(out.current_step, "routing_completed");
        assert!(out.analysis_results.is_empty());
        assert!(out.last_response().is_none());
        assert!(out.confidence_score.is_none());
    }
}
