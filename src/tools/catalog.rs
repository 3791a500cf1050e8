//! Tool registry loading from TOML
//!
//! The built-in catalogue is embedded at compile time and parsed once at
//! startup. Lookup is exact-match and case-sensitive.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{PiaError, Result};

use super::definition::{OutputContract, ToolDefinition};

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// TOML representation of a tool parameter
#[derive(Debug, Deserialize)]
struct TomlParam {
    #[serde(rename = "type")]
    param_type: String,
    description: Option<String>,
    doc: Option<String>,
    default: Option<toml::Value>,
}

/// TOML representation of a tool definition
#[derive(Debug, Deserialize)]
struct TomlTool {
    name: String,
    description: String,
    remote: Option<String>,
    output: Option<String>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    params: toml::Table,
}

/// TOML file structure
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    docs: HashMap<String, String>,
    #[serde(rename = "tool", default)]
    tools: Vec<TomlTool>,
}

/// Ordered registry of tool definitions
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Registry holding the tools this server ships with
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Load registry from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: TomlCatalog =
            toml::from_str(content).map_err(|e| PiaError::Catalog(format!("Failed to parse TOML: {}", e)))?;

        let mut registry = Self::default();
        for toml_tool in catalog.tools {
            let tool = Self::convert_toml_tool(toml_tool, &catalog.docs)?;
            registry.add(tool)?;
        }

        log::debug!("Loaded {} tool definitions", registry.len());
        Ok(registry)
    }

    /// Convert TOML tool to a ToolDefinition
    fn convert_toml_tool(toml_tool: TomlTool, docs: &HashMap<String, String>) -> Result<ToolDefinition> {
        let mut properties = Map::new();
        for (name, raw) in toml_tool.params {
            let param: TomlParam = raw.try_into().map_err(|e| {
                PiaError::Catalog(format!("Invalid parameter '{}' for tool '{}': {}", name, toml_tool.name, e))
            })?;

            let mut prop = Map::new();
            prop.insert("type".to_string(), Value::String(param.param_type));

            let description = match (param.description, param.doc) {
                (Some(desc), _) => Some(desc),
                (None, Some(key)) => Some(docs.get(&key).cloned().ok_or_else(|| {
                    PiaError::Catalog(format!("Unknown doc '{}' referenced by tool '{}'", key, toml_tool.name))
                })?),
                (None, None) => None,
            };
            if let Some(desc) = description {
                prop.insert("description".to_string(), Value::String(desc));
            }
            if let Some(default) = param.default {
                prop.insert("default".to_string(), serde_json::to_value(default)?);
            }
            properties.insert(name, Value::Object(prop));
        }

        if let Some(missing) = toml_tool.required.iter().find(|r| !properties.contains_key(r.as_str())) {
            return Err(PiaError::Catalog(format!(
                "Tool '{}' requires undeclared parameter '{}'",
                toml_tool.name, missing
            )));
        }

        let mut schema = serde_json::json!({
            "type": "object",
            "properties": properties,
        });
        if !toml_tool.required.is_empty() {
            schema["required"] = serde_json::json!(toml_tool.required);
        }

        let mut tool = ToolDefinition::new(toml_tool.name, toml_tool.description).with_schema(schema);

        if let Some(remote) = toml_tool.remote {
            tool = tool.with_remote_name(remote);
        }
        if let Some(output) = toml_tool.output {
            let contract = OutputContract::from_str(&output).ok_or_else(|| {
                PiaError::Catalog(format!("Invalid output contract '{}' for tool '{}'", output, tool.name))
            })?;
            tool = tool.with_output(contract);
        }

        Ok(tool)
    }

    /// Register a tool, rejecting duplicate names
    pub fn add(&mut self, tool: ToolDefinition) -> Result<()> {
        if self.index.contains_key(&tool.name) {
            return Err(PiaError::Catalog(format!("Duplicate tool '{}'", tool.name)));
        }
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by exact name
    pub fn get(&self, name: &str) -> Result<&ToolDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| PiaError::ToolNotFound(name.to_string()))
    }

    /// All tools in registration order
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Get number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
