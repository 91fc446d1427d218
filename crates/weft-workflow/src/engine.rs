use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use weft_core::config::AppConfig;
use weft_core::error::{Result, WeftError};
use weft_core::event::{EventSink, WorkflowEvent};
use weft_core::traits::{ChatModel, PluginInvoker};
use weft_core::types::{value_to_text, RunId};
use weft_llm::SparkClient;

use crate::context::ExecutionContext;
use crate::executor::end::FINAL_OUTPUT;
use crate::executor::{
    run_node, EndExecutor, ExecutorRegistry, LlmExecutor, PluginExecutor, StartExecutor,
};
use crate::graph::{Graph, NodeKind};
use crate::plugins::AiToolsClient;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: RunId,
    /// Node ids in the order they ran.
    pub order: Vec<String>,
    /// The end node's `final_output`, if the run reached one.
    pub final_output: Option<String>,
    /// Every variable bound during the run.
    pub variables: BTreeMap<String, Value>,
    pub elapsed_ms: u64,
}

/// Drives a graph through its executors.
///
/// The engine holds only the executor table; all per-run state lives in an
/// [`ExecutionContext`] created by [`execute`](Self::execute), so one engine
/// can serve concurrent runs.
pub struct WorkflowEngine {
    registry: ExecutorRegistry,
}

impl WorkflowEngine {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Engine with the four standard executors over the given collaborators.
    pub fn standard(
        model: Arc<dyn ChatModel>,
        plugins: Arc<dyn PluginInvoker>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            ExecutorRegistry::new()
                .with(StartExecutor)
                .with(LlmExecutor::new(model, config.spark.domain.clone()))
                .with(PluginExecutor::new(plugins, config.plugins.default_speed))
                .with(EndExecutor),
        )
    }

    /// Standard engine backed by the Spark chat service and the AI tools
    /// HTTP service.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let model = Arc::new(SparkClient::new(config.spark.clone()));
        let plugins = Arc::new(AiToolsClient::new(&config.plugins)?);
        Ok(Self::standard(model, plugins, config))
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Run `graph` once.
    ///
    /// Nodes run strictly in order; the first failure aborts the rest.
    /// The terminal `workflow_complete` event is left to the caller.
    pub async fn execute(
        &self,
        graph: &Graph,
        initial_inputs: BTreeMap<String, Value>,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExecutionReport> {
        let started = Instant::now();
        let order = graph.execution_order()?;
        let start_id = order
            .first()
            .map(|n| n.id().to_string())
            .ok_or(WeftError::NoStartNode)?;

        let mut ctx = ExecutionContext::new(initial_inputs, sink);
        for (name, value) in &ctx.initial_inputs {
            ctx.variables.set(&start_id, name, value.clone());
        }

        info!(
            run_id = %ctx.run_id,
            start = %start_id,
            nodes = order.len(),
            "Workflow started"
        );

        let mut final_output = None;
        for graph_node in &order {
            let resolved = graph_node
                .kind
                .ok_or_else(|| WeftError::NoExecutor(graph_node.type_label().to_string()))
                .and_then(|kind| self.registry.get(kind));
            let executor = match resolved {
                Ok(executor) => executor,
                Err(e) => {
                    ctx.emit(WorkflowEvent::node_error(graph_node.id(), e.to_string()));
                    return Err(e);
                }
            };

            let outputs = run_node(executor.as_ref(), graph_node, &mut ctx).await?;
            if graph_node.kind == Some(NodeKind::End) {
                final_output = outputs.get(FINAL_OUTPUT).map(value_to_text);
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(run_id = %ctx.run_id, elapsed_ms, "Workflow finished");

        Ok(ExecutionReport {
            run_id: ctx.run_id,
            order: order.iter().map(|n| n.id().to_string()).collect(),
            final_output,
            variables: ctx.variables.snapshot(),
            elapsed_ms,
        })
    }
}
