use std::sync::Arc;

use agentwire_agent::GraphExecutor;
use agentwire_core::config::AppConfig;
use agentwire_tools::ToolRegistry;

use crate::registry::ConnectionRegistry;

/// Shared application state for axum handlers.
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ConnectionRegistry>,
    pub executor: Arc<GraphExecutor>,
    pub tools: Arc<ToolRegistry>,
}
