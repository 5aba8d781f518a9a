use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, warn};

use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::ToolResult;

pub struct FileSearchTool {
    timeout_secs: u64,
}

impl FileSearchTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[derive(Deserialize)]
struct FileSearchInput {
    directory: String,
    #[serde(default)]
    pattern: String,
}

impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }

    fn description(&self) -> &str {
        "Recursively list files under a directory whose file name contains a pattern (e.g. \".pdf\")."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to search in"
                },
                "pattern": {
                    "type": "string",
                    "description": "Substring the file name must contain (default: match all)"
                }
            },
            "required": ["directory"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: FileSearchInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;

            debug!(directory = %params.directory, pattern = %params.pattern, "File search");

            let paths = tokio::task::spawn_blocking(move || {
                search(Path::new(&params.directory), &params.pattern)
            })
            .await
            .map_err(|e| AgentwireError::ToolExecution {
                tool: "file_search".to_string(),
                message: format!("Search task failed: {}", e),
            })??;

            debug!(count = paths.len(), "File search complete");

            let listing: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            Ok(ToolResult::success(serde_json::json!(listing)))
        })
    }
}

/// Files below `directory` whose name contains `pattern`, sorted by path.
///
/// A missing directory yields an empty list rather than an error.
pub fn search(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        warn!(directory = %directory.display(), "Directory not found");
        return Ok(Vec::new());
    }

    let escaped = glob::Pattern::escape(&directory.to_string_lossy());
    let full_pattern = format!("{}/**/*", escaped.trim_end_matches('/'));

    let entries = glob::glob(&full_pattern).map_err(|e| AgentwireError::ToolExecution {
        tool: "file_search".to_string(),
        message: format!("Invalid pattern: {}", e),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|name| name.to_string_lossy().contains(pattern))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("nested/deeper/annual.pdf"), b"").unwrap();
        dir
    }

    #[test]
    fn matches_file_names_recursively() {
        let dir = fixture();
        let found = search(dir.path(), ".pdf").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|p| p.ends_with("nested/deeper/annual.pdf")));
        assert!(found.iter().all(|p| p.is_file()));
    }

    #[test]
    fn empty_pattern_lists_every_file() {
        let dir = fixture();
        assert_eq!(search(dir.path(), "").unwrap().len(), 3);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = search(&dir.path().join("absent"), ".pdf").unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn tool_returns_json_list() {
        let dir = fixture();
        let result = FileSearchTool::new(5)
            .execute(serde_json::json!({
                "directory": dir.path().to_string_lossy(),
                "pattern": "notes"
            }))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_field_is_rejected() {
        let err = FileSearchTool::new(5)
            .execute(serde_json::json!({ "pattern": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentwireError::ToolValidation(_)));
    }

    #[test]
    fn timeout_comes_from_configuration() {
        assert_eq!(FileSearchTool::new(7).timeout_secs(), 7);
    }
}
