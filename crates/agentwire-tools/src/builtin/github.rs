//! GitHub issue and pull request listings.

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{info, warn};

use agentwire_core::config::GithubConfig;
use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::ToolResult;

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, timeout_secs: u64) -> Result<Self> {
        let token = config.token.clone().filter(|t| !t.is_empty());
        if token.is_none() {
            warn!("No GitHub token configured, unauthenticated requests are rate limited");
        }
        Ok(Self {
            http: super::http_client(
                "github",
                concat!("agentwire/", env!("CARGO_PKG_VERSION")),
                timeout_secs,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            timeout_secs,
        })
    }

    async fn list(&self, tool: &str, repo: &str, kind: &str, state: &str) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo, kind);
        let mut req = self
            .http
            .get(&url)
            .query(&[("state", state), ("per_page", "100")])
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| AgentwireError::ToolExecution {
            tool: tool.to_string(),
            message: format!("Request failed: {}", e),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentwireError::ToolExecution {
                tool: tool.to_string(),
                message: format!("GitHub API error: {} {}", status.as_u16(), body),
            });
        }

        resp.json().await.map_err(|e| AgentwireError::ToolExecution {
            tool: tool.to_string(),
            message: format!("Invalid response: {}", e),
        })
    }
}

#[derive(Deserialize)]
struct ListInput {
    repo: String,
    #[serde(default = "default_state")]
    state: String,
}

fn default_state() -> String {
    "open".to_string()
}

impl ListInput {
    fn validate(self) -> Result<Self> {
        let mut parts = self.repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !well_formed {
            return Err(AgentwireError::ToolValidation(format!(
                "repo must look like 'owner/name', got '{}'",
                self.repo
            )));
        }
        if !matches!(self.state.as_str(), "open" | "closed" | "all") {
            return Err(AgentwireError::ToolValidation(format!(
                "state must be open, closed, or all, got '{}'",
                self.state
            )));
        }
        Ok(self)
    }
}

/// Reduce a GitHub issue or pull request object to its summary fields.
pub fn summarize(item: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": item["id"],
        "number": item["number"],
        "title": item["title"],
        "user": item["user"]["login"],
        "state": item["state"],
        "url": item["html_url"],
    })
}

fn list_schema(what: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "repo": {
                "type": "string",
                "description": "Repository full name, e.g. \"rust-lang/rust\""
            },
            "state": {
                "type": "string",
                "enum": ["open", "closed", "all"],
                "description": format!("Which {} to list (default: open)", what)
            }
        },
        "required": ["repo"]
    })
}

pub struct GithubIssuesTool {
    client: GithubClient,
}

impl GithubIssuesTool {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

impl Tool for GithubIssuesTool {
    fn name(&self) -> &str {
        "github_issues"
    }

    fn description(&self) -> &str {
        "List issues (excluding pull requests) of a GitHub repository."
    }

    fn input_schema(&self) -> serde_json::Value {
        list_schema("issues")
    }

    fn timeout_secs(&self) -> u64 {
        self.client.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: ListInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;
            let params = params.validate()?;

            info!(repo = %params.repo, state = %params.state, "Fetching issues");
            let items = self
                .client
                .list(self.name(), &params.repo, "issues", &params.state)
                .await?;

            let issues: Vec<serde_json::Value> = items
                .iter()
                .filter(|item| item.get("pull_request").is_none())
                .map(summarize)
                .collect();
            Ok(ToolResult::success(serde_json::Value::Array(issues)))
        })
    }
}

pub struct GithubPullsTool {
    client: GithubClient,
}

impl GithubPullsTool {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

impl Tool for GithubPullsTool {
    fn name(&self) -> &str {
        "github_prs"
    }

    fn description(&self) -> &str {
        "List pull requests of a GitHub repository."
    }

    fn input_schema(&self) -> serde_json::Value {
        list_schema("pull requests")
    }

    fn timeout_secs(&self) -> u64 {
        self.client.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: ListInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;
            let params = params.validate()?;

            info!(repo = %params.repo, state = %params.state, "Fetching pull requests");
            let items = self
                .client
                .list(self.name(), &params.repo, "pulls", &params.state)
                .await?;

            let prs: Vec<serde_json::Value> = items.iter().map(summarize).collect();
            Ok(ToolResult::success(serde_json::Value::Array(prs)))
        })
    }
}
