//! Error types for the hostinfo MCP server.

use thiserror::Error;

use crate::mcp::protocol::error_codes;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the server.
///
/// Every variant maps onto one JSON-RPC error code through [`Error::code`].
/// Domain failures of a tool body (an unreachable API, a missing file) are
/// not errors at this level; they travel inside a successful result with
/// `isError` set.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Protocol Errors =====
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    // ===== MCP Errors =====
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Unknown prompt: {0}")]
    PromptNotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    // ===== Fetch Errors =====
    #[error("HTTP error! status: {status}")]
    Fetch { status: u16 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Internal Errors =====
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout: operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl Error {
    /// JSON-RPC error code reported for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => error_codes::PARSE_ERROR,
            Self::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_)
            | Self::ToolNotFound(_)
            | Self::PromptNotFound(_)
            | Self::InvalidToolArguments(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}
