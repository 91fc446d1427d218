use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info};

use weft_core::error::{Result, WeftError};
use weft_core::event::{EventSink, WorkflowEvent};
use weft_core::traits::DslLoader;

use crate::engine::{ExecutionReport, WorkflowEngine};
use crate::graph::Graph;

/// Caller side of a run: loads the graph, bounds the run by a timeout and
/// emits the terminal event (`workflow_complete` or a run-level `error`).
pub struct WorkflowService {
    engine: Arc<WorkflowEngine>,
    loader: Arc<dyn DslLoader>,
    run_timeout: Duration,
}

impl WorkflowService {
    pub fn new(engine: Arc<WorkflowEngine>, loader: Arc<dyn DslLoader>, run_timeout: Duration) -> Self {
        Self {
            engine,
            loader,
            run_timeout,
        }
    }

    /// Load `flow_id` and run it.
    pub async fn run(
        &self,
        flow_id: &str,
        inputs: BTreeMap<String, Value>,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExecutionReport> {
        info!(flow_id, "Workflow run requested");
        let run = async {
            let dsl = self.loader.load(flow_id).await?;
            let graph = Graph::from_dsl(dsl)?;
            self.engine.execute(&graph, inputs, sink.clone()).await
        };
        let outcome = self.bounded(run).await;
        finish(outcome, sink.as_ref())
    }

    /// Run an already loaded graph.
    pub async fn run_graph(
        &self,
        graph: &Graph,
        inputs: BTreeMap<String, Value>,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExecutionReport> {
        let outcome = self
            .bounded(self.engine.execute(graph, inputs, sink.clone()))
            .await;
        finish(outcome, sink.as_ref())
    }

    /// Fire-and-forget [`run`](Self::run) on the Tokio runtime.
    pub fn spawn(
        self: &Arc<Self>,
        flow_id: impl Into<String>,
        inputs: BTreeMap<String, Value>,
        sink: Arc<dyn EventSink>,
    ) -> JoinHandle<Result<ExecutionReport>> {
        let service = Arc::clone(self);
        let flow_id = flow_id.into();
        tokio::spawn(async move { service.run(&flow_id, inputs, sink).await })
    }

    async fn bounded<F>(&self, run: F) -> Result<ExecutionReport>
    where
        F: std::future::Future<Output = Result<ExecutionReport>>,
    {
        tokio::time::timeout(self.run_timeout, run)
            .await
            .unwrap_or_else(|_| {
                Err(WeftError::Timeout {
                    phase: "run".into(),
                    secs: self.run_timeout.as_secs(),
                })
            })
    }
}

fn finish(outcome: Result<ExecutionReport>, sink: &dyn EventSink) -> Result<ExecutionReport> {
    match &outcome {
        Ok(report) => {
            info!(run_id = %report.run_id, elapsed_ms = report.elapsed_ms, "Workflow complete");
            sink.emit(WorkflowEvent::complete("success"));
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Workflow failed");
            sink.emit(WorkflowEvent::run_error(e.kind(), e.to_string()));
        }
    }
    outcome
}
