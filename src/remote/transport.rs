//! HTTP transport to the remote endpoint
//!
//! The forwarder only sees the [`RemoteTransport`] trait, so tests can swap
//! the reqwest client for a scripted one.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::RemoteConfig;
use crate::error::{PiaError, Result};

use super::envelope::RpcRequest;
use super::outcome::LocalFailure;

/// Raw HTTP reply: status and undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one envelope and returns whatever came back
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// POST `request` authenticated with `api_key`
    ///
    /// Any HTTP status is an `Ok`; only failures to get a reply at all are
    /// reported as `Err`.
    async fn post(&self, request: &RpcRequest, api_key: &str) -> std::result::Result<HttpReply, LocalFailure>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    url: String,
    api_key_header: String,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PiaError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
            api_key_header: config.api_key_header.clone(),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn post(&self, request: &RpcRequest, api_key: &str) -> std::result::Result<HttpReply, LocalFailure> {
        log::debug!("POST {} method={}", self.url, request.method);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(self.api_key_header.as_str(), api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let reply = reply_from_body(status, response.text().await.map_err(classify_reqwest_error))?;

        log::debug!("{} replied {} ({} bytes)", self.url, status, reply.body.len());
        Ok(reply)
    }
}

/// A non-2xx status survives an unreadable body
fn reply_from_body(
    status: u16,
    body: std::result::Result<String, LocalFailure>,
) -> std::result::Result<HttpReply, LocalFailure> {
    match body {
        Ok(body) => Ok(HttpReply::new(status, body)),
        Err(failure) if !(200..300).contains(&status) => {
            log::warn!("Could not read body of {} reply: {}", status, failure);
            Ok(HttpReply::new(status, format!("(body unavailable: {})", failure)))
        }
        Err(failure) => Err(failure),
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> LocalFailure {
    if e.is_timeout() {
        LocalFailure::Timeout
    } else {
        LocalFailure::Network(e.to_string())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("api_key_header", &self.api_key_header)
            .finish()
    }
}
