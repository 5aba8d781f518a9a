use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::ToolResult;

/// A collaborator the gateway can dispatch actions to.
pub trait Tool: Send + Sync + 'static {
    /// Action name (the `action` field of a dispatch request).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for the action parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the action with the given parameters.
    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>>;

    /// Timeout in seconds for this tool.
    fn timeout_secs(&self) -> u64 {
        30
    }
}
