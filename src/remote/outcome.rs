//! Classified result of one forwarded call
//!
//! Every failure renders to a single line of text with a stable prefix so
//! callers can tell the failure class apart: `Error:`, `API Error:` or
//! `HTTP Error <code>:`.

use serde_json::Value;
use thiserror::Error;

/// Message reported when no credential is available
pub const MISSING_CREDENTIAL: &str = "PIA API key is required. Please provide --api-key argument.";

/// Adapter-side failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalFailure {
    /// No API key from the command line or environment
    #[error("{} Configure API key in MCP server settings.", MISSING_CREDENTIAL)]
    MissingCredential,
    /// Tool name is not registered
    #[error("Unknown tool {0}")]
    UnknownTool(String),
    /// A required argument is absent
    #[error("Missing required argument: {0}")]
    MissingArgument(String),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Connection could not be made or was dropped
    #[error("{0}")]
    Network(String),
    /// 2xx reply that is not a JSON-RPC response
    #[error("Invalid response from API: {0}")]
    MalformedResponse(String),
    /// Reply carried neither `result` nor `error`
    #[error("No results returned from API")]
    NoResult,
    /// Anything else, including a panic inside the call
    #[error("{0}")]
    Internal(String),
}

/// Outcome of a forwarded call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Remote `result` member, passed through untouched
    Success(Value),
    /// Remote `error.message`
    RemoteError(String),
    /// Non-2xx status with the raw body
    TransportError { status: u16, body: String },
    /// Failure on this side of the wire
    LocalError(LocalFailure),
}

impl Outcome {
    /// Whether this is a `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Render as the text handed back to the caller
    pub fn render(&self) -> String {
        match self {
            Self::Success(value) => render_value(value),
            Self::RemoteError(message) => format!("API Error: {}", message),
            Self::TransportError { status, body } => format!("HTTP Error {}: {}", status, body),
            Self::LocalError(failure) => format!("Error: {}", failure),
        }
    }
}

impl From<LocalFailure> for Outcome {
    fn from(failure: LocalFailure) -> Self {
        Self::LocalError(failure)
    }
}

/// Pretty-printed JSON, non-ASCII kept as-is
fn render_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
