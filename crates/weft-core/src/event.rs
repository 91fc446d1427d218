use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Lifecycle status carried by `node_start` / `node_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Started,
    Completed,
}

/// Progress event streamed to the caller during a workflow run.
///
/// Serialises as `{"event": "<name>", "data": {...camelCase fields}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum WorkflowEvent {
    NodeStart {
        node_id: String,
        node_type: String,
        status: NodeStatus,
    },
    NodeOutput {
        node_id: String,
        output_name: String,
        output_value: serde_json::Value,
    },
    NodeEnd {
        node_id: String,
        node_type: String,
        status: NodeStatus,
    },
    /// A node failed; the run is aborted.
    Error {
        node_id: String,
        error_message: String,
    },
    LlmThinking {
        node_id: String,
        prompt: String,
    },
    VoiceSynthesisStart {
        node_id: String,
        vcn: String,
        text_length: usize,
    },
    WorkflowComplete {
        status: String,
    },
    /// Caller-level failure outside any node (loading, timeouts). Shares the
    /// `error` event name with node failures.
    #[serde(rename = "error")]
    RunFailed {
        error: String,
        message: String,
    },
}

impl WorkflowEvent {
    pub fn node_start(node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::NodeStart {
            node_id: node_id.into(),
            node_type: node_type.into(),
            status: NodeStatus::Started,
        }
    }

    pub fn node_output(
        node_id: impl Into<String>,
        output_name: impl Into<String>,
        output_value: serde_json::Value,
    ) -> Self {
        Self::NodeOutput {
            node_id: node_id.into(),
            output_name: output_name.into(),
            output_value,
        }
    }

    pub fn node_end(node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::NodeEnd {
            node_id: node_id.into(),
            node_type: node_type.into(),
            status: NodeStatus::Completed,
        }
    }

    pub fn node_error(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            node_id: node_id.into(),
            error_message: message.into(),
        }
    }

    /// Caller-level failure (not attributable to a single node).
    pub fn run_error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RunFailed {
            error: kind.into(),
            message: message.into(),
        }
    }

    pub fn complete(status: impl Into<String>) -> Self {
        Self::WorkflowComplete {
            status: status.into(),
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeStart { .. } => "node_start",
            Self::NodeOutput { .. } => "node_output",
            Self::NodeEnd { .. } => "node_end",
            Self::Error { .. } | Self::RunFailed { .. } => "error",
            Self::LlmThinking { .. } => "llm_thinking",
            Self::VoiceSynthesisStart { .. } => "voice_synthesis_start",
            Self::WorkflowComplete { .. } => "workflow_complete",
        }
    }

    /// Event payload without the envelope.
    pub fn data(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null)
    }

    /// Render as one server-sent-events frame.
    pub fn to_sse(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data())
    }
}

/// Destination for progress events.
///
/// Emission never fails: once the consumer is gone, events are dropped.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: WorkflowEvent);
}

/// Event bus using tokio broadcast channel.
/// All subscribers receive all events.
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: WorkflowEvent) {
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: WorkflowEvent) {
        self.publish(event);
    }
}

/// Per-run sink feeding a single consumer (e.g. one SSE response).
///
/// Dropping the receiver, or calling [`close`](Self::close), tears the sink
/// down; later emissions are no-ops.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WorkflowEvent>,
    active: AtomicBool,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                active: AtomicBool::new(true),
            },
            rx,
        )
    }

    pub fn close(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed) && !self.tx.is_closed()
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: WorkflowEvent) {
        if !self.active.load(Ordering::Relaxed) {
            return;
        }
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped, discarding further events");
            self.active.store(false, Ordering::Relaxed);
        }
    }
}
