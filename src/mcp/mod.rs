//! MCP hosting - stdio framing, message types and the request server

mod codec;
mod messages;
mod server;

pub use codec::{Frame, McpCodec};
pub use messages::{ErrorCode, McpError, McpRequest, McpResponse, methods};
pub use server::{DEFAULT_PROTOCOL_VERSION, McpServer, McpServerConfig};
