//! Prompt Renderer - substitute arguments into templates using Handlebars

use std::collections::HashMap;

use handlebars::Handlebars;

use crate::error::{PiaError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Prompt text is plain Markdown, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Register a named template for later use
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| PiaError::Template(format!("Failed to register template '{}': {}", name, e)))
    }

    /// Render a previously registered template
    pub fn render_named(&self, name: &str, context: &HashMap<String, String>) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| PiaError::Template(format!("Failed to render template '{}': {}", name, e)))
    }
}
