//! pia-mcp - MCP adapter for the Program Integrity Alliance database
//!
//! Exposes a fixed catalog of search tools and prompts to an MCP client over
//! stdio and forwards every tool call to the remote PIA endpoint as a single
//! JSON-RPC `tools/call` request.

pub mod config;
pub mod error;
pub mod mcp;
pub mod prompt;
pub mod remote;
pub mod tools;

pub use error::{PiaError, Result};
