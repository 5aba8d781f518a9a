use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentwireError, Result};

/// Top-level agentwire configuration.
///
/// Every section is optional in the TOML file; missing sections fall back
/// to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8002".to_string()
}

/// Workflow engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Pause between emitted step events, in milliseconds. Purely cosmetic.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Maximum node visits in one turn before the turn is aborted.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            max_steps: default_max_steps(),
        }
    }
}

fn default_step_delay_ms() -> u64 {
    300
}

fn default_max_steps() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Closed session records kept for inspection (oldest evicted first).
    #[serde(default = "default_retain_closed")]
    pub retain_closed: usize,
    /// Frames queued per connection before further events are dropped.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            retain_closed: default_retain_closed(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_retain_closed() -> usize {
    256
}

fn default_outbound_buffer() -> usize {
    256
}

/// External collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            weather: WeatherConfig::default(),
            github: GithubConfig::default(),
            pdf: PdfConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

fn default_tool_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_weather_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_user_agent() -> String {
    format!("agentwire/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_url")]
    pub base_url: String,
    /// Personal access token; unauthenticated requests are rate limited.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_url(),
            token: None,
        }
    }
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

/// PDF summarisation. Without an API key the summary is the opening sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_summary_url")]
    pub api_url: String,
    #[serde(default = "default_summary_model")]
    pub model: String,
    #[serde(default = "default_summary_sentences")]
    pub fallback_sentences: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_summary_url(),
            model: default_summary_model(),
            fallback_sentences: default_summary_sentences(),
        }
    }
}

fn default_summary_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_summary_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_summary_sentences() -> usize {
    3
}

/// Outgoing mail over SMTP with STARTTLS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: None,
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            sender: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| AgentwireError::ConfigNotFound(path.display().to_string()))?;
        Self::parse(&content)
    }

    /// Parse config from TOML text, with env var expansion.
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self =
            toml::from_str(&expanded).map_err(|e| AgentwireError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.workflow.max_steps == 0 {
            return Err(AgentwireError::Config(
                "workflow.max_steps must be at least 1".to_string(),
            ));
        }
        if self.sessions.outbound_buffer == 0 {
            return Err(AgentwireError::Config(
                "sessions.outbound_buffer must be at least 1".to_string(),
            ));
        }
        if self.tools.timeout_secs == 0 {
            return Err(AgentwireError::Config(
                "tools.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AgentwireError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}
