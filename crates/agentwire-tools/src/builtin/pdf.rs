//! PDF text extraction and summarisation.

use std::path::PathBuf;

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{info, warn};

use agentwire_core::config::PdfConfig;
use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::ToolResult;

const NO_TEXT: &str = "Could not extract text from PDF.";
const MAX_PROMPT_CHARS: usize = 4000;

pub struct PdfSummarizeTool {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    fallback_sentences: usize,
    timeout_secs: u64,
}

impl PdfSummarizeTool {
    pub fn new(config: &PdfConfig, timeout_secs: u64) -> Result<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty());
        if api_key.is_none() {
            info!("No summarisation API key configured, PDF summaries use leading sentences");
        }
        Ok(Self {
            http: super::http_client(
                "pdf_summarize",
                concat!("agentwire/", env!("CARGO_PKG_VERSION")),
                timeout_secs,
            )?,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            fallback_sentences: config.fallback_sentences.max(1),
            timeout_secs,
        })
    }

    /// Ask the chat-completions endpoint for a summary; `None` on any failure.
    async fn remote_summary(&self, text: &str) -> Option<String> {
        let key = self.api_key.as_ref()?;
        let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "Summarize the following text." },
                { "role": "user", "content": excerpt }
            ],
            "max_tokens": 256
        });

        let resp = match self.http.post(&self.api_url).bearer_auth(key).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Summarisation request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "Summarisation API error");
            return None;
        }

        let reply: serde_json::Value = match resp.json().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Summarisation API returned invalid JSON");
                return None;
            }
        };
        reply["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Deserialize)]
struct PdfInput {
    path: String,
}

/// The first `max_sentences` period-delimited sentences of `text`.
pub fn leading_sentences(text: &str, max_sentences: usize) -> String {
    text.split('.')
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(".")
        .trim()
        .to_string()
}

fn extract_text(path: PathBuf) -> Result<String> {
    pdf_extract::extract_text(&path).map_err(|e| AgentwireError::ToolExecution {
        tool: "pdf_summarize".to_string(),
        message: format!("Failed to read {}: {}", path.display(), e),
    })
}

impl Tool for PdfSummarizeTool {
    fn name(&self) -> &str {
        "pdf_summarize"
    }

    fn description(&self) -> &str {
        "Extract the text of a local PDF file and summarise it."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the PDF file"
                }
            },
            "required": ["path"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: PdfInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;
            let path = PathBuf::from(&params.path);
            if !path.is_file() {
                return Err(AgentwireError::ToolValidation(format!(
                    "no such file: {}",
                    params.path
                )));
            }

            info!(path = %params.path, "Extracting PDF text");
            let text = tokio::task::spawn_blocking(move || extract_text(path))
                .await
                .map_err(|e| AgentwireError::ToolExecution {
                    tool: "pdf_summarize".to_string(),
                    message: format!("Extraction task failed: {}", e),
                })??;

            if text.trim().is_empty() {
                return Ok(ToolResult::error(NO_TEXT));
            }

            let summary = match self.remote_summary(&text).await {
                Some(summary) => summary,
                None => leading_sentences(&text, self.fallback_sentences),
            };
            Ok(ToolResult::success(summary))
        })
    }
}
