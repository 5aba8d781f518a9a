use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentwireError {
    // Session registry errors
    #[error("Session already connected: {0}")]
    DuplicateSession(String),

    #[error("Session not found: {0}")]
    UnknownSession(String),

    #[error("Delivery to session {0} failed")]
    Delivery(String),

    #[error("Unsupported frame: {0}")]
    Protocol(String),

    // Workflow errors
    #[error("No edge from node '{node}' matches label '{label}'")]
    Routing { node: String, label: String },

    #[error("Node '{node}' failed: {message}")]
    NodeExecution { node: String, message: String },

    #[error("Workflow exceeded {0} node visits")]
    StepLimit(usize),

    #[error("Invalid workflow graph: {0}")]
    Graph(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Collaborator errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Tool timeout after {timeout_secs}s: {tool}")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    #[error("Tool input validation failed: {0}")]
    ToolValidation(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentwireError>;
