use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    // Engine errors
    #[error("No start node found in workflow")]
    NoStartNode,

    #[error("No executor found for node type: {0}")]
    NoExecutor(String),

    // Node errors
    #[error("Unsupported plugin: {0}")]
    UnsupportedPlugin(String),

    #[error("Missing '{name}' for node {node_id}")]
    MissingParameter { node_id: String, name: String },

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Node {node_id} is typed '{id_type}' by its id but '{meta_type}' by its metadata")]
    NodeTypeMismatch {
        node_id: String,
        id_type: String,
        meta_type: String,
    },

    // Model service errors
    #[error("Model service error {code}: {message}")]
    RemoteApi { code: i64, message: String },

    #[error("Stream closed before receiving complete response")]
    IncompleteStream,

    #[error("LLM connection failed: {0}")]
    LlmConnect(String),

    #[error("LLM streaming error: {0}")]
    LlmStream(String),

    #[error("Timed out after {secs}s during {phase}")]
    Timeout { phase: String, secs: u64 },

    #[error("Request signing failed: {0}")]
    Signing(String),

    // Plugin errors
    #[error("Plugin call failed: {tool}: {message}")]
    Plugin { tool: String, message: String },

    // Workflow document errors
    #[error("Invalid workflow document: {0}")]
    Dsl(String),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WeftError {
    /// Shorthand for a missing node parameter or input.
    pub fn missing(node_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingParameter {
            node_id: node_id.into(),
            name: name.into(),
        }
    }

    /// Short, stable name of the error kind (used in caller-level error events).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoStartNode => "NoStartNodeError",
            Self::NoExecutor(_) => "NoExecutorError",
            Self::UnsupportedPlugin(_) => "UnsupportedPluginError",
            Self::MissingParameter { .. } => "MissingParameterError",
            Self::VariableNotFound(_) => "VariableNotFoundError",
            Self::NodeTypeMismatch { .. } => "NodeTypeMismatchError",
            Self::RemoteApi { .. } => "RemoteApiError",
            Self::IncompleteStream => "IncompleteStreamError",
            Self::LlmConnect(_) | Self::LlmStream(_) => "TransportError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Signing(_) => "SigningError",
            Self::Plugin { .. } => "PluginError",
            Self::Dsl(_) => "DslError",
            Self::WorkflowNotFound(_) => "WorkflowNotFoundError",
            Self::Config(_) | Self::ConfigNotFound(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
        }
    }
}

pub type Result<T> = std::result::Result<T, WeftError>;
