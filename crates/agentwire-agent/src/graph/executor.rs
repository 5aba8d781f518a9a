use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::event::{EventSink, WorkflowEvent};

use super::edge::{self, Edge, END};
use super::node::Node;
use crate::state::WorkflowState;

const DEFAULT_MAX_STEPS: usize = 16;

/// Result of executing one turn through the graph.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The final state after the last node.
    pub state: WorkflowState,
    /// Node ids in visit order.
    pub visited: Vec<String>,
    /// Total execution time in milliseconds.
    pub elapsed_ms: u64,
}

impl ExecutionResult {
    /// The reply produced by the last answering node, if any.
    pub fn response(&self) -> Option<&str> {
        self.state.last_response().map(|m| m.content.as_str())
    }
}

/// Executes a workflow graph.
///
/// The graph is immutable after construction and can be shared across
/// sessions behind an `Arc`; `execute` takes `&self`.
#[derive(Debug)]
pub struct GraphExecutor {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
    entry_node: String,
    step_delay: Duration,
    max_steps: usize,
}

impl GraphExecutor {
    /// Create a new graph executor.
    ///
    /// Fails if node ids collide, the entry node is missing, or an edge
    /// references an unknown node.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, entry_node: impl Into<String>) -> Result<Self> {
        let entry_node = entry_node.into();
        let mut node_map = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if node.id == END {
                return Err(AgentwireError::Graph(format!("'{}' is reserved", END)));
            }
            let id = node.id.clone();
            if node_map.insert(id.clone(), node).is_some() {
                return Err(AgentwireError::Graph(format!("duplicate node '{}'", id)));
            }
        }

        if !node_map.contains_key(&entry_node) {
            return Err(AgentwireError::Graph(format!(
                "entry node '{}' not found",
                entry_node
            )));
        }
        for edge in &edges {
            if !node_map.contains_key(&edge.from) {
                return Err(AgentwireError::Graph(format!(
                    "edge source '{}' not found",
                    edge.from
                )));
            }
            if !edge.is_terminal() && !node_map.contains_key(&edge.to) {
                return Err(AgentwireError::Graph(format!(
                    "edge target '{}' not found",
                    edge.to
                )));
            }
        }

        Ok(Self {
            nodes: node_map,
            edges,
            entry_node,
            step_delay: Duration::ZERO,
            max_steps: DEFAULT_MAX_STEPS,
        })
    }

    /// Pause after each visited node (cosmetic pacing for streaming clients).
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Cap on node visits per turn.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn entry_node(&self) -> &str {
        &self.entry_node
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.keys().map(|s| s.as_str()).collect()
    }

    /// Display name for a node id, e.g. `"Search Knowledge"`.
    pub fn display_name(&self, id: &str) -> Option<String> {
        self.nodes.get(id).map(|n| n.display_name())
    }

    /// Run one turn from the entry node until the terminal sink.
    ///
    /// A `StepStarted` event is emitted before each node runs and a
    /// `Response` event after each node that appended a reply. The first
    /// failing node or unroutable label ends the turn with an error.
    pub async fn execute(
        &self,
        initial: WorkflowState,
        sink: &dyn EventSink,
    ) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut state = initial;
        let mut visited: Vec<String> = Vec::new();
        let mut current = self.entry_node.clone();

        while current != END {
            if visited.len() >= self.max_steps {
                warn!(
                    session_id = %state.session_id,
                    max_steps = self.max_steps,
                    "Workflow step limit reached"
                );
                return Err(AgentwireError::StepLimit(self.max_steps));
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| AgentwireError::Graph(format!("node '{}' not found", current)))?;

            sink.emit(WorkflowEvent::StepStarted {
                step_number: state.step_count + 1,
                node: node.id.clone(),
                current_step: state.current_step.clone(),
                tools_used: state.tools_used.clone(),
                confidence_score: state.confidence_score,
            });

            info!(session_id = %state.session_id, node = %node.id, "Executing workflow node");
            let node_start = Instant::now();
            let messages_before = state.messages.len();

            state = node.run(state)?;
            state.step_count += 1;
            visited.push(node.id.clone());

            debug!(
                node = %node.id,
                step = state.step_count,
                elapsed_ms = node_start.elapsed().as_millis() as u64,
                "Node execution complete"
            );

            if state.messages.len() > messages_before {
                if let Some(reply) = state.last_response() {
                    sink.emit(WorkflowEvent::Response {
                        step_number: state.step_count,
                        node: node.id.clone(),
                        current_step: state.current_step.clone(),
                        content: reply.content.clone(),
                        tools_used: state.tools_used.clone(),
                        confidence_score: state.confidence_score,
                    });
                }
            }

            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }

            let label = state.next_action.take();
            current = self.next_node(&node.id, label)?;
        }

        Ok(ExecutionResult {
            state,
            visited,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Resolve the successor of `from`. No outgoing edges means the turn is done.
    fn next_node(&self, from: &str, label: Option<String>) -> Result<String> {
        let outgoing: Vec<&Edge> = self.edges.iter().filter(|e| e.from == from).collect();
        if outgoing.is_empty() {
            return Ok(END.to_string());
        }

        match edge::select(&outgoing, label.as_deref()) {
            Some(edge) => {
                if let (Some(label), super::EdgeCondition::Fallback) = (&label, &edge.condition) {
                    warn!(node = from, label = %label, to = %edge.to, "Unrouted label, taking fallback edge");
                }
                Ok(edge.to.clone())
            }
            None => Err(AgentwireError::Routing {
                node: from.to_string(),
                label: label.unwrap_or_default(),
            }),
        }
    }
}
