use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use weft_core::event::{EventSink, WorkflowEvent};
use weft_core::types::RunId;

use crate::variables::VariableStore;

/// State owned by a single execution and threaded through every node.
pub struct ExecutionContext {
    pub run_id: RunId,
    pub variables: VariableStore,
    /// Caller-supplied inputs, re-exposed by the start node.
    pub initial_inputs: BTreeMap<String, Value>,
    sink: Arc<dyn EventSink>,
}

impl ExecutionContext {
    pub fn new(initial_inputs: BTreeMap<String, Value>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: RunId::new(),
            variables: VariableStore::new(),
            initial_inputs,
            sink,
        }
    }

    pub fn emit(&self, event: WorkflowEvent) {
        self.sink.emit(event);
    }
}
