//! Prompt System - the prompt catalog and its Handlebars renderer

mod catalog;
mod render;

pub use catalog::{PromptArgument, PromptCatalog, PromptContent, PromptDefinition, PromptMessage, PromptResult};
pub use render::PromptRenderer;
