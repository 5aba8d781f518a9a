use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use agentwire_core::error::{AgentwireError, Result};

use crate::state::WorkflowState;
use crate::steps::{title_case, Step};

/// A node in the workflow graph: an id bound to a step function.
#[derive(Clone)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: String,
    step: Arc<dyn Step>,
}

impl Node {
    /// Create a node registered under the step's own name.
    pub fn new(step: impl Step) -> Self {
        Self {
            id: step.name().to_string(),
            step: Arc::new(step),
        }
    }

    /// Create a node under an explicit id.
    pub fn with_id(id: impl Into<String>, step: impl Step) -> Self {
        Self {
            id: id.into(),
            step: Arc::new(step),
        }
    }

    /// `"calculate_metrics"` → `"Calculate Metrics"`.
    pub fn display_name(&self) -> String {
        title_case(&self.id)
    }

    /// Run the step, turning both errors and panics into `NodeExecution`.
    pub fn run(&self, state: WorkflowState) -> Result<WorkflowState> {
        let step = &self.step;
        match panic::catch_unwind(AssertUnwindSafe(|| step.run(state))) {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(e @ AgentwireError::NodeExecution { .. })) => Err(e),
            Ok(Err(e)) => Err(AgentwireError::NodeExecution {
                node: self.id.clone(),
                message: e.to_string(),
            }),
            Err(payload) => Err(AgentwireError::NodeExecution {
                node: self.id.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("id", &self.id).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "step panicked".to_string()
    }
}
