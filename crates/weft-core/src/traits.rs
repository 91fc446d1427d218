use futures::future::BoxFuture;

use crate::dsl::WorkflowDsl;
use crate::error::Result;
use crate::types::{ChatRequest, PluginCall};

/// Chat model: sends a message list and returns the complete reply text.
pub trait ChatModel: Send + Sync + 'static {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Run one chat call to completion.
    fn chat(&self, request: ChatRequest) -> BoxFuture<'_, Result<String>>;
}

/// Plugin invoker: calls an external tool service.
pub trait PluginInvoker: Send + Sync + 'static {
    /// Execute a tool operation and return the raw response body.
    fn invoke(&self, call: PluginCall) -> BoxFuture<'_, Result<serde_json::Value>>;
}

/// Workflow source: resolves a flow id to its document.
pub trait DslLoader: Send + Sync + 'static {
    fn load(&self, flow_id: &str) -> BoxFuture<'_, Result<WorkflowDsl>>;
}
