//! Tool registry and dispatch

mod catalog;
mod definition;
mod dispatch;

pub use catalog::ToolRegistry;
pub use definition::{OutputContract, ToolDefinition};
pub use dispatch::Dispatcher;
