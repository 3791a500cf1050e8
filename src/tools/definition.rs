//! Tool definitions and output contracts
//!
//! A tool is a locally advertised name bound to one remote call name, with a
//! JSON schema describing its inputs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::remote::Arguments;

/// Named, advisory shape of a successful tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputContract {
    /// Paged search results with citations
    SearchResults,
}

impl OutputContract {
    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "search-results" | "search_results" => Some(Self::SearchResults),
            _ => None,
        }
    }

    /// JSON schema for this contract
    pub fn schema(&self) -> Value {
        match self {
            Self::SearchResults => search_results_schema(),
        }
    }
}

fn search_results_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "output": {
                "type": "object",
                "properties": {
                    "total_count": { "type": "integer" },
                    "query": { "type": "string" },
                    "summary": { "type": "string" },
                    "results": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "title": { "type": "string" },
                                "snippet": { "type": "string" },
                                "score": { "type": "number" },
                                "data_source": { "type": "string" },
                                "url": { "type": "string", "format": "uri" },
                                "publication_date": { "type": "string", "format": "date-time" }
                            },
                            "required": ["id", "title", "data_source", "url"],
                            "additionalProperties": false
                        }
                    },
                    "citations": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "label": { "type": "string" },
                                "url": { "type": "string", "format": "uri" },
                                "title": { "type": "string" },
                                "data_source": { "type": "string" },
                                "publication_date": { "type": "string", "format": "date-time" }
                            },
                            "required": ["id", "label", "url"],
                            "additionalProperties": false
                        }
                    },
                    "references": { "type": "array", "items": { "type": "string" } },
                    "citation_guidance": { "type": "string" }
                },
                "required": ["total_count", "results"],
                "additionalProperties": false
            }
        },
        "required": ["output"],
        "additionalProperties": false
    })
}

/// A tool definition as advertised to MCP clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Tool name, matched exactly against incoming calls
    pub name: String,
    /// Human-readable description for the LLM consumer
    pub description: String,
    /// JSON schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// JSON schema of a successful result, advisory only
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Method name sent to the remote endpoint
    #[serde(skip)]
    pub remote_name: String,
}

impl ToolDefinition {
    /// Create a new tool forwarding under its own name
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            remote_name: name.clone(),
            name,
            description: description.into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            output_schema: None,
        }
    }

    /// Set input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Forward under a different remote call name
    pub fn with_remote_name(mut self, remote_name: impl Into<String>) -> Self {
        self.remote_name = remote_name.into();
        self
    }

    /// Attach an advisory output contract
    pub fn with_output(mut self, contract: OutputContract) -> Self {
        self.output_schema = Some(contract.schema());
        self
    }

    /// Names of the parameters the schema marks as required
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// First required parameter absent (or null) in `arguments`
    pub fn missing_required(&self, arguments: &Arguments) -> Option<String> {
        self.required_params()
            .into_iter()
            .find(|param| arguments.get(*param).is_none_or(Value::is_null))
            .map(str::to_string)
    }
}
