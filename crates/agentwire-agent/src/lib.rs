pub mod graph;
pub mod state;
pub mod steps;

pub use graph::{Edge, EdgeCondition, ExecutionResult, GraphExecutor, Node, END};
pub use state::{TurnCarry, WorkflowState};
pub use steps::Step;
