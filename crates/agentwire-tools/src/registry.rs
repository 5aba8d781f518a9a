use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use agentwire_core::config::ToolsConfig;
use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::{ToolDefinition, ToolResult};

use crate::builtin::email::SendEmailTool;
use crate::builtin::file_search::FileSearchTool;
use crate::builtin::github::{GithubClient, GithubIssuesTool, GithubPullsTool};
use crate::builtin::pdf::PdfSummarizeTool;
use crate::builtin::weather::{NwsClient, WeatherAlertsTool, WeatherForecastTool};

/// Registry of available collaborators.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool.
    pub fn register(&mut self, tool: impl Tool) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by name, bounded by the tool's timeout.
    pub async fn execute(&self, name: &str, input: serde_json::Value) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentwireError::ToolNotFound(name.to_string()))?;

        let timeout = std::time::Duration::from_secs(tool.timeout_secs());
        debug!(tool = name, "Executing tool");

        match tokio::time::timeout(timeout, tool.execute(input)).await {
            Ok(result) => result,
            Err(_) => Err(AgentwireError::ToolTimeout {
                tool: name.to_string(),
                timeout_secs: tool.timeout_secs(),
            }),
        }
    }

    /// Execute a tool and fold any failure into an error result.
    pub async fn dispatch(&self, name: &str, input: serde_json::Value) -> ToolResult {
        match self.execute(name, input).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool dispatch failed");
                ToolResult::error(e.to_string())
            }
        }
    }

    /// Create a registry with all built-in collaborators registered.
    pub fn with_builtins(config: &ToolsConfig) -> Result<Self> {
        let mut registry = Self::new();

        registry.register(FileSearchTool::new(config.timeout_secs));

        let nws = NwsClient::new(&config.weather, config.timeout_secs)?;
        registry.register(WeatherAlertsTool::new(nws.clone()));
        registry.register(WeatherForecastTool::new(nws));

        let github = GithubClient::new(&config.github, config.timeout_secs)?;
        registry.register(GithubIssuesTool::new(github.clone()));
        registry.register(GithubPullsTool::new(github));

        registry.register(PdfSummarizeTool::new(&config.pdf, config.timeout_secs)?);
        registry.register(SendEmailTool::new(&config.email, config.timeout_secs));

        Ok(registry)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
