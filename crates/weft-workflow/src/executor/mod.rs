//! Node executors.
//!
//! Every node runs through [`run_node`], which owns the shared lifecycle:
//! `node_start`, input resolution, the variant logic, storing outputs with one
//! `node_output` each, then `node_end`. A failure emits a single `error`
//! event for the node and is returned to the engine.

pub mod end;
pub mod llm;
pub mod plugin;
pub mod start;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use weft_core::dsl::Node;
use weft_core::error::{Result, WeftError};
use weft_core::event::WorkflowEvent;

use crate::context::ExecutionContext;
use crate::graph::{GraphNode, NodeKind};
use crate::variables::VariableStore;

pub use end::EndExecutor;
pub use llm::LlmExecutor;
pub use plugin::PluginExecutor;
pub use start::StartExecutor;

/// Named values going into or out of a node.
pub type NodeValues = BTreeMap<String, Value>;

/// Variant-specific node logic.
pub trait NodeExecutor: Send + Sync + 'static {
    fn kind(&self) -> NodeKind;

    /// Compute the node's outputs from its resolved inputs.
    fn execute<'a>(
        &'a self,
        node: &'a Node,
        inputs: NodeValues,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<NodeValues>>;
}

/// Executors by node kind. Built once, shared read-only across runs.
#[derive(Default, Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(executor.kind(), executor);
    }

    pub fn with(mut self, executor: impl NodeExecutor) -> Self {
        self.register(Arc::new(executor));
        self
    }

    pub fn get(&self, kind: NodeKind) -> Result<&Arc<dyn NodeExecutor>> {
        self.executors
            .get(&kind)
            .ok_or_else(|| WeftError::NoExecutor(kind.to_string()))
    }
}

/// Resolve a node's declared inputs against the store. Inputs without a
/// bound value are skipped.
pub fn resolve_inputs(node: &Node, variables: &VariableStore) -> NodeValues {
    let mut inputs = NodeValues::new();
    for item in &node.data.inputs {
        match item.value() {
            Some(value) => {
                inputs.insert(item.name.clone(), variables.resolve_value(value));
            }
            None => {
                warn!(node_id = %node.id, input = %item.name, "Input has no value, skipping");
            }
        }
    }
    inputs
}

/// Run one node through its executor with the full event lifecycle.
pub async fn run_node(
    executor: &dyn NodeExecutor,
    graph_node: &GraphNode,
    ctx: &mut ExecutionContext,
) -> Result<NodeValues> {
    let node = &graph_node.node;
    let type_name = node.type_name();
    let started = Instant::now();

    info!(node_id = %node.id, kind = %graph_node.type_label(), name = %node.display_name(), "Executing node");
    ctx.emit(WorkflowEvent::node_start(&node.id, type_name));

    let inputs = resolve_inputs(node, &ctx.variables);
    debug!(node_id = %node.id, inputs = inputs.len(), "Inputs resolved");

    let outputs = match executor.execute(node, inputs, ctx).await {
        Ok(outputs) => outputs,
        Err(e) => {
            error!(node_id = %node.id, error = %e, "Node failed");
            ctx.emit(WorkflowEvent::node_error(&node.id, e.to_string()));
            return Err(e);
        }
    };

    for (name, value) in &outputs {
        ctx.variables.set(&node.id, name, value.clone());
        ctx.emit(WorkflowEvent::node_output(&node.id, name, value.clone()));
    }

    ctx.emit(WorkflowEvent::node_end(&node.id, type_name));
    debug!(
        node_id = %node.id,
        outputs = outputs.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Node complete"
    );
    Ok(outputs)
}
