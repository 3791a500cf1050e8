//! Tool dispatch
//!
//! Looks a tool up, checks its required arguments and hands it to the
//! forwarder. Whatever happens, the caller gets an [`Outcome`] back.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::remote::{Arguments, Forwarder, LocalFailure, Outcome};

use super::catalog::ToolRegistry;

/// Routes tool invocations to the remote endpoint
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    forwarder: Forwarder,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, forwarder: Forwarder) -> Self {
        Self {
            registry: Arc::new(registry),
            forwarder,
        }
    }

    /// Registry this dispatcher routes against
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke a tool and classify the result
    pub async fn dispatch(&self, name: &str, arguments: Arguments) -> Outcome {
        let tool = match self.registry.get(name) {
            Ok(tool) => tool,
            Err(_) => {
                log::warn!("Unknown tool requested: {}", name);
                return LocalFailure::UnknownTool(name.to_string()).into();
            }
        };

        if let Some(missing) = tool.missing_required(&arguments) {
            log::warn!("{} called without required argument {}", name, missing);
            return LocalFailure::MissingArgument(missing).into();
        }

        let call = self.forwarder.forward(&tool.remote_name, arguments);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log::error!("{} panicked: {}", name, message);
                LocalFailure::Internal(message).into()
            }
        }
    }

    /// Invoke a tool and render the outcome as text
    pub async fn call_tool(&self, name: &str, arguments: Arguments) -> String {
        self.dispatch(name, arguments).await.render()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}
