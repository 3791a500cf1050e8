//! Remote call forwarding - envelopes, credentials, transport and outcomes

mod credential;
mod envelope;
mod forwarder;
#[cfg(test)]
pub(crate) mod mock;
mod outcome;
mod transport;

pub use credential::ApiKeySource;
pub use envelope::{Arguments, JSONRPC_VERSION, RpcReply, RpcRequest, TOOLS_CALL};
pub use forwarder::Forwarder;
pub use outcome::{LocalFailure, MISSING_CREDENTIAL, Outcome};
pub use transport::{HttpReply, HttpTransport, RemoteTransport};
