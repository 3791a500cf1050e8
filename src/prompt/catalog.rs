//! Prompt catalog - named guidance templates with argument defaults
//!
//! Prompts never touch the network. A missing (or empty) argument is
//! replaced with a default phrase, so rendering never fails on absent input.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{PiaError, Result};

use super::render::PromptRenderer;

/// A declared prompt argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(skip)]
    pub default: String,
}

impl PromptArgument {
    fn new(name: &str, description: &str, required: bool, default: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
            default: default.into(),
        }
    }
}

/// A prompt as advertised to MCP clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    #[serde(skip)]
    template: &'static str,
}

/// Text content of a prompt message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: PromptContent,
}

/// Rendered prompt, shaped for `prompts/get`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

impl PromptResult {
    /// Text of the first message
    pub fn text(&self) -> &str {
        self.messages.first().map(|m| m.content.text.as_str()).unwrap_or_default()
    }
}

/// Ordered catalog of prompts
pub struct PromptCatalog {
    prompts: Vec<PromptDefinition>,
    renderer: PromptRenderer,
}

impl PromptCatalog {
    /// Build the catalog; `summary_results` is the default for `findings_summary`
    pub fn new(summary_results: u32) -> Result<Self> {
        let prompts = builtin_prompts(summary_results);

        let mut renderer = PromptRenderer::new();
        for prompt in &prompts {
            renderer.register_template(&prompt.name, prompt.template)?;
        }

        Ok(Self { prompts, renderer })
    }

    /// All prompts in catalog order
    pub fn list(&self) -> &[PromptDefinition] {
        &self.prompts
    }

    /// Render a prompt with caller arguments
    pub fn get(&self, name: &str, arguments: &HashMap<String, String>) -> Result<PromptResult> {
        let prompt = self
            .prompts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PiaError::PromptNotFound(name.to_string()))?;

        let context: HashMap<String, String> = prompt
            .arguments
            .iter()
            .map(|arg| {
                let value = arguments
                    .get(&arg.name)
                    .filter(|v| !v.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| arg.default.clone());
                (arg.name.clone(), value)
            })
            .collect();

        let text = self.renderer.render_named(&prompt.name, &context)?;
        log::debug!("Rendered prompt {} ({} chars)", name, text.len());

        Ok(PromptResult {
            description: prompt.description.clone(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: PromptContent {
                    kind: "text".to_string(),
                    text,
                },
            }],
        })
    }
}

fn builtin_prompts(summary_results: u32) -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            name: "fraud_investigation_search".to_string(),
            description: "Search for fraud investigations and related findings in the PIA database".to_string(),
            arguments: vec![
                PromptArgument::new("topic", "The fraud topic or area to investigate", true, "the requested subject area"),
                PromptArgument::new(
                    "time_period",
                    "Time period for the search (e.g., 'last 5 years')",
                    false,
                    "all available years",
                ),
            ],
            template: include_str!("templates/fraud_investigation_search.md"),
        },
        PromptDefinition {
            name: "compliance_recommendations".to_string(),
            description: "Find compliance recommendations and regulatory guidance".to_string(),
            arguments: vec![
                PromptArgument::new(
                    "area",
                    "The compliance area or domain to search",
                    true,
                    "the requested compliance area",
                ),
                PromptArgument::new("data_source", "Specific data source (GAO, OIG, etc.)", false, "all sources"),
            ],
            template: include_str!("templates/compliance_recommendations.md"),
        },
        PromptDefinition {
            name: "risk_analysis".to_string(),
            description: "Analyze risk factors and vulnerabilities in specific domains".to_string(),
            arguments: vec![
                PromptArgument::new("domain", "The domain or sector to analyze for risks", true, "the requested domain"),
                PromptArgument::new(
                    "risk_type",
                    "Type of risk to focus on (financial, operational, etc.)",
                    false,
                    "all risk types",
                ),
            ],
            template: include_str!("templates/risk_analysis.md"),
        },
        PromptDefinition {
            name: "findings_summary".to_string(),
            description: "Generate a comprehensive summary of findings about a specific subject".to_string(),
            arguments: vec![
                PromptArgument::new(
                    "subject",
                    "The subject or entity to summarize findings about",
                    true,
                    "the requested subject",
                ),
                PromptArgument::new(
                    "max_results",
                    "Maximum number of results to include in summary",
                    false,
                    summary_results.to_string(),
                ),
            ],
            template: include_str!("templates/findings_summary.md"),
        },
        PromptDefinition {
            name: "search_guidance".to_string(),
            description: "How to choose, filter and cite PIA search tools".to_string(),
            arguments: Vec::new(),
            template: include_str!("templates/search_guidance.md"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PromptCatalog {
        PromptCatalog::new(20).unwrap()
    }

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_list_order() {
        let binding = catalog();
        let names: Vec<&str> = binding.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fraud_investigation_search",
                "compliance_recommendations",
                "risk_analysis",
                "findings_summary",
                "search_guidance",
            ]
        );
    }

    #[test]
    fn test_list_serializes_arguments() {
        let catalog = catalog();
        let value = serde_json::to_value(&catalog.list()[0]).unwrap();
        assert_eq!(value["name"], "fraud_investigation_search");
        assert_eq!(value["arguments"][0]["name"], "topic");
        assert_eq!(value["arguments"][0]["required"], true);
        assert_eq!(value["arguments"][1]["required"], false);
        assert!(value["arguments"][0].get("default").is_none());
        assert!(value.get("template").is_none());
    }

    #[test]
    fn test_search_guidance_has_no_placeholders() {
        let result = catalog().get("search_guidance", &HashMap::new()).unwrap();
        let text = result.text();
        assert!(!text.trim().is_empty());
        assert!(!text.contains("{{"));
        assert!(!text.contains("}}"));
    }

    #[test]
    fn test_every_prompt_renders_without_arguments() {
        let catalog = catalog();
        for prompt in catalog.list() {
            let result = catalog.get(&prompt.name, &HashMap::new()).unwrap();
            assert!(!result.text().is_empty(), "{}", prompt.name);
            assert!(!result.text().contains("{{"), "{}", prompt.name);
        }
    }

    #[test]
    fn test_arguments_substituted() {
        let result = catalog()
            .get(
                "fraud_investigation_search",
                &args(&[("topic", "ambulance fraud"), ("time_period", "last 5 years")]),
            )
            .unwrap();
        assert!(result.text().contains("on the topic: \"ambulance fraud\""));
        assert!(result.text().contains("Time period: last 5 years"));
    }

    #[test]
    fn test_defaults_applied() {
        let catalog = catalog();

        let fraud = catalog.get("fraud_investigation_search", &HashMap::new()).unwrap();
        assert!(fraud.text().contains("\"the requested subject area\""));
        assert!(fraud.text().contains("Time period: all available years"));

        let compliance = catalog.get("compliance_recommendations", &args(&[("area", "grants")])).unwrap();
        assert!(compliance.text().contains("Data source preference: all sources"));

        let risk = catalog.get("risk_analysis", &args(&[("domain", "Medicaid")])).unwrap();
        assert!(risk.text().contains("Risk focus: all risk types"));
    }

    #[test]
    fn test_empty_argument_counts_as_absent() {
        let result = catalog().get("risk_analysis", &args(&[("domain", "")])).unwrap();
        assert!(result.text().contains("\"the requested domain\""));
    }

    #[test]
    fn test_findings_summary_uses_configured_default() {
        let catalog = PromptCatalog::new(35).unwrap();
        let result = catalog.get("findings_summary", &args(&[("subject", "SNAP")])).unwrap();
        assert!(result.text().contains("Maximum results to review: 35"));

        let result = catalog
            .get("findings_summary", &args(&[("subject", "SNAP"), ("max_results", "5")]))
            .unwrap();
        assert!(result.text().contains("Maximum results to review: 5"));
    }

    #[test]
    fn test_unknown_arguments_ignored() {
        let catalog = catalog();
        let plain = catalog.get("search_guidance", &HashMap::new()).unwrap();
        let extra = catalog.get("search_guidance", &args(&[("unexpected", "value")])).unwrap();
        assert_eq!(plain, extra);
    }

    #[test]
    fn test_unknown_prompt() {
        let err = catalog().get("nonexistent", &HashMap::new()).unwrap_err();
        assert!(matches!(err, PiaError::PromptNotFound(_)));
        assert_eq!(err.to_string(), "Prompt 'nonexistent' not found");
    }

    #[test]
    fn test_result_shape() {
        let result = catalog().get("risk_analysis", &args(&[("domain", "SNAP")])).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["description"], "Analyze risk factors and vulnerabilities in specific domains");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"]["type"], "text");
        assert!(value["messages"][0]["content"]["text"].as_str().unwrap().contains("SNAP"));
    }

    #[test]
    fn test_prompts_only_name_registered_tools() {
        let registry = crate::tools::ToolRegistry::builtin().unwrap();
        let catalog = catalog();
        for prompt in catalog.list() {
            let text = catalog.get(&prompt.name, &HashMap::new()).unwrap().text().to_string();
            for quoted in text.split('"').skip(1).step_by(2) {
                if quoted.starts_with("pia_") {
                    assert!(registry.get(quoted).is_ok(), "{} mentions unknown tool {}", prompt.name, quoted);
                }
            }
        }
    }
}
