//! Remote call forwarder
//!
//! One invocation is one JSON-RPC envelope, one POST and one classified
//! [`Outcome`]. There is no retry.

use std::sync::Arc;

use serde_json::Value;

use crate::config::RemoteConfig;
use crate::error::Result;

use super::credential::ApiKeySource;
use super::envelope::{Arguments, RpcReply, RpcRequest};
use super::outcome::{LocalFailure, Outcome};
use super::transport::{HttpTransport, RemoteTransport};

/// Forwards calls to the remote endpoint
#[derive(Clone)]
pub struct Forwarder {
    transport: Arc<dyn RemoteTransport>,
    credentials: ApiKeySource,
}

impl Forwarder {
    /// Create a forwarder over any transport
    pub fn new(transport: Arc<dyn RemoteTransport>, credentials: ApiKeySource) -> Self {
        Self { transport, credentials }
    }

    /// Forwarder over HTTP for the configured endpoint
    pub fn from_config(config: &RemoteConfig, api_key: Option<String>) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        log::info!("Forwarding to {} (timeout {}s)", transport.url(), config.timeout_secs);
        Ok(Self::new(
            Arc::new(transport),
            ApiKeySource::new(api_key, config.api_key_env.clone()),
        ))
    }

    /// Invoke a remote tool
    pub async fn forward(&self, remote_name: &str, arguments: Arguments) -> Outcome {
        log::info!("Forwarding tool call {}", remote_name);
        self.call(RpcRequest::tool_call(remote_name, arguments)).await
    }

    /// Invoke any remote JSON-RPC method
    pub async fn call_method(&self, method: &str, params: Option<Value>) -> Outcome {
        log::info!("Calling remote method {}", method);
        self.call(RpcRequest::new(method, params)).await
    }

    async fn call(&self, request: RpcRequest) -> Outcome {
        let Some(api_key) = self.credentials.resolve() else {
            log::warn!(
                "No API key: pass --api-key or set {}; {} not sent",
                self.credentials.env_var(),
                request.method
            );
            return LocalFailure::MissingCredential.into();
        };

        let reply = match self.transport.post(&request, &api_key).await {
            Ok(reply) => reply,
            Err(failure) => {
                log::error!("{} failed: {}", request.method, failure);
                return failure.into();
            }
        };

        if !reply.is_success() {
            log::error!("{} returned HTTP {}", request.method, reply.status);
            return Outcome::TransportError {
                status: reply.status,
                body: reply.body,
            };
        }

        let body: Value = match serde_json::from_str(&reply.body) {
            Ok(body) => body,
            Err(e) => {
                log::error!("{} returned invalid JSON: {}", request.method, e);
                return LocalFailure::MalformedResponse(e.to_string()).into();
            }
        };

        match RpcReply::classify(body) {
            Some(RpcReply::Result(result)) => Outcome::Success(result),
            Some(RpcReply::Error(message)) => {
                log::warn!("{} reported an error: {}", request.method, message);
                Outcome::RemoteError(message)
            }
            Some(RpcReply::Empty) => LocalFailure::NoResult.into(),
            None => LocalFailure::MalformedResponse("expected a JSON object".to_string()).into(),
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("credentials", &self.credentials)
            .finish()
    }
}
