//! Error types for pia-mcp
//!
//! Centralized error handling using thiserror. Per-call forwarding failures
//! are not errors at this level; they are reported as
//! [`Outcome`](crate::remote::Outcome) values instead.

use thiserror::Error;

/// All error types that can occur while setting up or serving pia-mcp
#[derive(Debug, Error)]
pub enum PiaError {
    /// Tool catalogue could not be parsed or is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Tool name is not registered
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Prompt name is not registered
    #[error("Prompt '{0}' not found")]
    PromptNotFound(String),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// HTTP client could not be constructed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed MCP traffic
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pia-mcp operations
pub type Result<T> = std::result::Result<T, PiaError>;
