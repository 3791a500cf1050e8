//! Scripted transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::envelope::RpcRequest;
use super::outcome::LocalFailure;
use super::transport::{HttpReply, RemoteTransport};

/// Records every request and answers from a queue of replies
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<std::result::Result<HttpReply, LocalFailure>>>,
    requests: Mutex<Vec<(RpcRequest, String)>>,
    calls: AtomicUsize,
    panic_on_call: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that panics when called
    pub fn panicking() -> Self {
        Self {
            panic_on_call: true,
            ..Self::default()
        }
    }

    /// Queue a 200 reply with the given JSON body
    pub fn with_json(self, body: Value) -> Self {
        self.with_reply(HttpReply::new(200, body.to_string()))
    }

    /// Queue a raw reply
    pub fn with_reply(self, reply: HttpReply) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    /// Queue a transport failure
    pub fn with_failure(self, failure: LocalFailure) -> Self {
        self.replies.lock().unwrap().push_back(Err(failure));
        self
    }

    /// Number of posts made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, with the key they carried
    pub fn requests(&self) -> Vec<(RpcRequest, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn post(&self, request: &RpcRequest, api_key: &str) -> std::result::Result<HttpReply, LocalFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_call {
            panic!("transport exploded");
        }
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), api_key.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LocalFailure::Network("no scripted reply".to_string())))
    }
}
