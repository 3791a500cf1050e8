//! MCP Server - JSON-RPC over stdio
//!
//! Provides:
//! - Line-framed request reading and response writing
//! - Method routing for tools and prompts
//! - One task per `tools/call`, cancellable by request id
//! - A single writer so responses never interleave

use std::collections::HashMap;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::{PiaError, Result};
use crate::prompt::PromptCatalog;
use crate::remote::Arguments;
use crate::tools::Dispatcher;

use super::codec::{Frame, McpCodec};
use super::messages::{McpError, McpRequest, McpResponse, methods};

/// Protocol version offered when the client does not name one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

fn instructions(max_results: u32) -> String {
    format!(
        "Search the Program Integrity Alliance (PIA) database of oversight documents. \
Use the pia_search_* tools for content and title search, the facets tools to discover filter values, \
and fetch to retrieve a full document. Searches return at most {} results per call. \
The search_guidance prompt explains filters and citation.",
        max_results
    )
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Name reported in `serverInfo`
    pub name: String,
    /// Version reported in `serverInfo`
    pub version: String,
    /// Result cap advertised in the instructions
    pub max_results: u32,
    /// Outbound response queue depth
    pub channel_capacity: usize,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: "pia-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_results: 50,
            channel_capacity: 64,
        }
    }
}

impl McpServerConfig {
    /// Config with a custom server name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Config advertising a different result cap
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelledParams {
    request_id: Value,
}

/// MCP server over any async reader/writer pair
pub struct McpServer {
    config: McpServerConfig,
    dispatcher: Dispatcher,
    prompts: Arc<PromptCatalog>,
}

impl McpServer {
    pub fn new(config: McpServerConfig, dispatcher: Dispatcher, prompts: PromptCatalog) -> Self {
        Self {
            config,
            dispatcher,
            prompts: Arc::new(prompts),
        }
    }

    /// Serve on the process's stdin/stdout
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until `reader` reaches EOF
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        log::info!(
            "{} {} serving {} tools, {} prompts",
            self.config.name,
            self.config.version,
            self.dispatcher.registry().len(),
            self.prompts.list().len()
        );

        let (tx, mut rx) = mpsc::channel::<McpResponse>(self.config.channel_capacity);

        let write_loop = async move {
            let mut sink = FramedWrite::new(writer, McpCodec::new());
            while let Some(response) = rx.recv().await {
                sink.send(response).await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let read_loop = async {
            let tx = tx;
            let mut frames = FramedRead::new(reader, McpCodec::new());
            let mut in_flight = InFlight::default();

            loop {
                tokio::select! {
                    frame = frames.next() => {
                        match frame {
                            Some(Ok(Frame::Message(value))) => {
                                self.handle_message(value, &tx, &mut in_flight).await;
                            }
                            Some(Ok(Frame::Malformed(reason))) => {
                                log::warn!("Malformed message: {}", reason);
                                let error = McpError::parse_error(format!("Parse error: {}", reason));
                                send(&tx, McpResponse::error(Value::Null, error)).await;
                            }
                            Some(Err(e)) => {
                                log::error!("Failed to read from client: {}", e);
                                break;
                            }
                            None => {
                                log::info!("Client closed input");
                                break;
                            }
                        }
                    }
                    Some(done) = in_flight.tasks.join_next(), if !in_flight.tasks.is_empty() => {
                        if let Ok((key, seq)) = done {
                            in_flight.finished(&key, seq);
                        }
                    }
                }
            }

            // In-flight calls still answer after EOF
            if !in_flight.tasks.is_empty() {
                log::info!("Waiting for {} in-flight calls", in_flight.tasks.len());
            }
            while in_flight.tasks.join_next().await.is_some() {}
            drop(tx);
        };

        let ((), written) = tokio::join!(read_loop, write_loop);
        written.map_err(PiaError::from)
    }

    async fn handle_message(
        &self,
        value: Value,
        tx: &mpsc::Sender<McpResponse>,
        in_flight: &mut InFlight,
    ) {
        // Responses from the client carry no method; nothing to answer
        if value.get("method").is_none() && (value.get("result").is_some() || value.get("error").is_some()) {
            log::debug!("Ignoring client response {}", value);
            return;
        }

        let id_hint = value.get("id").cloned().unwrap_or(Value::Null);
        let request: McpRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Invalid request: {}", e);
                send(tx, McpResponse::error(id_hint, McpError::invalid_request(e.to_string()))).await;
                return;
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request, in_flight);
            return;
        };

        log::debug!("Request {} {}", id, request.method);

        if request.method == methods::TOOLS_CALL {
            match parse_call_params(request.params) {
                Ok((name, arguments)) => self.spawn_tool_call(id, name, arguments, tx, in_flight),
                Err(error) => send(tx, McpResponse::error(id, error)).await,
            }
            return;
        }

        let outcome = self.handle_request(&request.method, request.params);
        send(tx, McpResponse::from_result(id, outcome)).await;
    }

    fn handle_notification(&self, request: &McpRequest, in_flight: &mut InFlight) {
        match request.method.as_str() {
            methods::INITIALIZED => log::info!("Client initialized"),
            methods::CANCELLED => match serde_json::from_value::<CancelledParams>(request.params.clone()) {
                Ok(params) => {
                    let key = params.request_id.to_string();
                    if in_flight.cancel(&key) {
                        log::info!("Cancelled request {}", key);
                    } else {
                        log::debug!("Cancel for unknown or finished request {}", key);
                    }
                }
                Err(e) => log::warn!("Invalid cancel notification: {}", e),
            },
            other => log::debug!("Ignoring notification {}", other),
        }
    }

    fn handle_request(&self, method: &str, params: Value) -> std::result::Result<Value, McpError> {
        match method {
            methods::INITIALIZE => Ok(self.initialize(&params)),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": self.dispatcher.registry().list() })),
            methods::PROMPTS_LIST => Ok(json!({ "prompts": self.prompts.list() })),
            methods::PROMPTS_GET => self.get_prompt(params),
            other => {
                log::warn!("Unknown method {}", other);
                Err(McpError::method_not_found(other))
            }
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        if let Some(client) = params.get("clientInfo") {
            log::info!("Initialize from {} (protocol {})", client, version);
        }

        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version
            },
            "instructions": instructions(self.config.max_results)
        })
    }

    fn get_prompt(&self, params: Value) -> std::result::Result<Value, McpError> {
        let params: GetPromptParams = serde_json::from_value(params)
            .map_err(|e| McpError::invalid_params(format!("Invalid prompts/get params: {}", e)))?;

        let arguments: HashMap<String, String> = params
            .arguments
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::Null => None,
                Value::String(s) => Some((k, s)),
                other => Some((k, other.to_string())),
            })
            .collect();

        match self.prompts.get(&params.name, &arguments) {
            Ok(result) => serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string())),
            Err(e @ PiaError::PromptNotFound(_)) => Err(McpError::invalid_params(e.to_string())),
            Err(e) => {
                log::error!("Prompt {} failed: {}", params.name, e);
                Err(McpError::internal_error(e.to_string()))
            }
        }
    }

    fn spawn_tool_call(
        &self,
        id: Value,
        name: String,
        arguments: Arguments,
        tx: &mpsc::Sender<McpResponse>,
        in_flight: &mut InFlight,
    ) {
        let key = id.to_string();
        let dispatcher = self.dispatcher.clone();
        let tx = tx.clone();

        in_flight.spawn(key, async move {
            let outcome = dispatcher.dispatch(&name, arguments).await;
            let result = json!({
                "content": [{ "type": "text", "text": outcome.render() }],
                "isError": !outcome.is_success()
            });
            send(&tx, McpResponse::success(id, result)).await;
        });
    }
}

/// Running tool calls, cancellable by request id
///
/// Each call gets a sequence number so a finished call only clears its own
/// entry when the client reuses an id.
#[derive(Default)]
struct InFlight {
    tasks: JoinSet<(String, u64)>,
    handles: HashMap<String, (u64, AbortHandle)>,
    next_seq: u64,
}

impl InFlight {
    fn spawn<F>(&mut self, key: String, call: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let seq = self.next_seq;
        self.next_seq += 1;

        let task_key = key.clone();
        let handle = self.tasks.spawn(async move {
            call.await;
            (task_key, seq)
        });
        if self.handles.insert(key.clone(), (seq, handle)).is_some() {
            log::warn!("Request id {} reused while a call with that id is still running", key);
        }
    }

    /// Abort the call registered under `key`
    fn cancel(&mut self, key: &str) -> bool {
        match self.handles.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn finished(&mut self, key: &str, seq: u64) {
        if self.handles.get(key).is_some_and(|(current, _)| *current == seq) {
            self.handles.remove(key);
        }
    }
}

fn parse_call_params(params: Value) -> std::result::Result<(String, Arguments), McpError> {
    let params: CallToolParams = serde_json::from_value(params)
        .map_err(|e| McpError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

    match params.arguments {
        None | Some(Value::Null) => Ok((params.name, Arguments::new())),
        Some(Value::Object(map)) => Ok((params.name, map)),
        Some(_) => Err(McpError::invalid_params("tools/call arguments must be an object")),
    }
}

async fn send(tx: &mpsc::Sender<McpResponse>, response: McpResponse) {
    if tx.send(response).await.is_err() {
        log::warn!("Writer closed; dropping response");
    }
}
