/// Progress notification produced while a workflow turn executes.
///
/// The engine emits one `StepStarted` before every node it visits and one
/// `Response` after every node that appended an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    StepStarted {
        step_number: u32,
        node: String,
        current_step: String,
        tools_used: Vec<String>,
        confidence_score: Option<f64>,
    },
    Response {
        step_number: u32,
        node: String,
        current_step: String,
        content: String,
        tools_used: Vec<String>,
        confidence_score: Option<f64>,
    },
}

impl WorkflowEvent {
    pub fn node(&self) -> &str {
        match self {
            Self::StepStarted { node, .. } | Self::Response { node, .. } => node,
        }
    }
}

/// Anything that wants to observe workflow progress.
///
/// Emission never fails from the caller's point of view: a sink that cannot
/// deliver is expected to log and drop.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

impl<F> EventSink for F
where
    F: Fn(WorkflowEvent) + Send + Sync,
{
    fn emit(&self, event: WorkflowEvent) {
        self(event)
    }
}
