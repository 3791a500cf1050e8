//! JSON-RPC 2.0 envelopes exchanged with the remote endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Caller-supplied arguments, forwarded verbatim
pub type Arguments = Map<String, Value>;

/// JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// Every outbound request carries this id; one request per connection
pub const REQUEST_ID: u64 = 1;

/// Remote method used for tool invocations
pub const TOOLS_CALL: &str = "tools/call";

/// Outbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    /// Request for an arbitrary remote method
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: REQUEST_ID,
            method: method.into(),
            params,
        }
    }

    /// `tools/call` request for one remote tool
    pub fn tool_call(name: &str, arguments: Arguments) -> Self {
        Self::new(
            TOOLS_CALL,
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

/// What a 2xx response body says
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    /// `result` member, which may itself be null
    Result(Value),
    /// `error.message`, or "Unknown error" when absent
    Error(String),
    /// Neither member present
    Empty,
}

impl RpcReply {
    /// Classify a decoded body; `None` when the body is not a JSON object
    pub fn classify(body: Value) -> Option<Self> {
        let Value::Object(mut fields) = body else {
            return None;
        };

        // A non-null `error` wins over `result`
        if let Some(error) = fields.remove("error").filter(|e| !e.is_null()) {
            let message = match &error {
                Value::Object(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
                Value::String(s) => Some(s.clone()),
                _ => None,
            };
            return Some(Self::Error(message.unwrap_or_else(|| "Unknown error".to_string())));
        }

        Some(match fields.remove("result") {
            Some(result) => Self::Result(result),
            None => Self::Empty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_envelope() {
        let mut args = Arguments::new();
        args.insert("query".into(), json!("ambulance fraud"));
        args.insert("filter".into(), json!("data_source eq 'GAO'"));

        let request = RpcRequest::tool_call("pia_search_content", args);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {
                    "name": "pia_search_content",
                    "arguments": {
                        "query": "ambulance fraud",
                        "filter": "data_source eq 'GAO'"
                    }
                }
            })
        );
    }

    #[test]
    fn test_envelope_without_params() {
        let value = serde_json::to_value(RpcRequest::new("tools/list", None)).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}));
    }

    #[test]
    fn test_classify_result() {
        let reply = RpcReply::classify(json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}}));
        assert_eq!(reply, Some(RpcReply::Result(json!({"ok": true}))));
    }

    #[test]
    fn test_classify_null_result() {
        let reply = RpcReply::classify(json!({"result": null}));
        assert_eq!(reply, Some(RpcReply::Result(Value::Null)));
    }

    #[test]
    fn test_classify_error() {
        let reply = RpcReply::classify(json!({"error": {"code": -32000, "message": "Rate limit exceeded"}}));
        assert_eq!(reply, Some(RpcReply::Error("Rate limit exceeded".into())));
    }

    #[test]
    fn test_classify_error_without_message() {
        let reply = RpcReply::classify(json!({"error": {"code": -32000}}));
        assert_eq!(reply, Some(RpcReply::Error("Unknown error".into())));
    }

    #[test]
    fn test_classify_error_wins_over_result() {
        let reply = RpcReply::classify(json!({"error": {"message": "bad"}, "result": 1}));
        assert_eq!(reply, Some(RpcReply::Error("bad".into())));
    }

    #[test]
    fn test_classify_null_error_is_ignored() {
        let reply = RpcReply::classify(json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}, "error": null}));
        assert_eq!(reply, Some(RpcReply::Result(json!({"ok": true}))));

        let reply = RpcReply::classify(json!({"error": null}));
        assert_eq!(reply, Some(RpcReply::Empty));
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(RpcReply::classify(json!({"jsonrpc": "2.0"})), Some(RpcReply::Empty));
    }

    #[test]
    fn test_classify_non_object() {
        assert_eq!(RpcReply::classify(json!([1, 2])), None);
    }
}
