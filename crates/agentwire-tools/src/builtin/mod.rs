pub mod email;
pub mod file_search;
pub mod github;
pub mod pdf;
pub mod weather;

use agentwire_core::error::AgentwireError;

/// Build the shared HTTP client for a remote collaborator.
pub(crate) fn http_client(
    tool: &str,
    user_agent: &str,
    timeout_secs: u64,
) -> agentwire_core::error::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| AgentwireError::ToolExecution {
            tool: tool.to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })
}
