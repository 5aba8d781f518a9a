//! Workflow graph engine: content-routed, event-emitting node execution.
//!
//! A workflow is a directed graph of [`Node`]s connected by [`Edge`]s. The
//! entry node (the router) chooses an action label; the executor follows
//! the edge registered for that label, runs the action node, and stops at
//! [`END`]. Every node visit is announced to an [`EventSink`] before it
//! runs, and every reply a node produces is announced after.
//!
//! [`EventSink`]: agentwire_core::event::EventSink

pub mod edge;
pub mod executor;
pub mod node;

pub use edge::{Edge, EdgeCondition, END};
pub use executor::{ExecutionResult, GraphExecutor};
pub use node::Node;

use std::time::Duration;

use agentwire_core::config::WorkflowConfig;
use agentwire_core::error::Result;

use crate::steps::{
    AnalyzeContent, CalculateMetrics, GeneralResponse, ProcessWorkflow, Router, SearchKnowledge,
    ANALYZE_CONTENT, CALCULATE_METRICS, GENERAL_RESPONSE, PROCESS_WORKFLOW, ROUTER,
    SEARCH_KNOWLEDGE,
};

/// The two-level graph: route once, run exactly one action node, stop.
pub fn standard_graph(config: &WorkflowConfig) -> Result<GraphExecutor> {
    let nodes = vec![
        Node::new(Router),
        Node::new(AnalyzeContent),
        Node::new(SearchKnowledge),
        Node::new(CalculateMetrics),
        Node::new(ProcessWorkflow),
        Node::new(GeneralResponse),
    ];

    let actions = [
        ANALYZE_CONTENT,
        SEARCH_KNOWLEDGE,
        CALCULATE_METRICS,
        PROCESS_WORKFLOW,
        GENERAL_RESPONSE,
    ];

    let mut edges: Vec<Edge> = actions
        .iter()
        .map(|action| Edge::on_label(ROUTER, *action, *action))
        .collect();
    edges.push(Edge::fallback(ROUTER, GENERAL_RESPONSE));
    edges.extend(actions.iter().map(|action| Edge::to_end(*action)));

    Ok(GraphExecutor::new(nodes, edges, ROUTER)?
        .with_step_delay(Duration::from_millis(config.step_delay_ms))
        .with_max_steps(config.max_steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_graph_builds() {
        let config = WorkflowConfig::default();
        let graph = standard_graph(&config).unwrap();
        assert_eq!(graph.entry_node(), ROUTER);
        assert_eq!(graph.node_ids().len(), 6);
    }
}
