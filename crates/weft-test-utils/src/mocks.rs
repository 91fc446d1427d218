use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use weft_core::dsl::WorkflowDsl;
use weft_core::error::{Result, WeftError};
use weft_core::event::{EventSink, WorkflowEvent};
use weft_core::traits::{ChatModel, DslLoader, PluginInvoker};
use weft_core::types::{ChatRequest, PluginCall};

enum Reply {
    Text(String),
    RemoteError { code: i64, message: String },
}

/// Scripted chat model.
///
/// Replies are served in order; once the script runs out every call echoes
/// its last message as `echo: <content>`. All requests are recorded.
#[derive(Default)]
pub struct MockChatModel {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Reply::Text(text.into()));
        self
    }

    pub fn with_remote_error(self, code: i64, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Reply::RemoteError {
            code,
            message: message.into(),
        });
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn chat(&self, request: ChatRequest) -> BoxFuture<'_, Result<String>> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);
        let reply = self.script.lock().unwrap().pop_front();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match reply {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::RemoteError { code, message }) => {
                    Err(WeftError::RemoteApi { code, message })
                }
                None => Ok(format!("echo: {last}")),
            }
        })
    }
}

/// Plugin invoker returning a fixed response body.
pub struct MockPluginInvoker {
    response: Value,
    calls: Mutex<Vec<PluginCall>>,
}

impl MockPluginInvoker {
    /// Responds with `{"code": 0, "data": {"voice_url": <url>}}`.
    pub fn voice_url(url: &str) -> Self {
        Self::responding(json!({"code": 0, "data": {"voice_url": url}}))
    }

    pub fn responding(response: Value) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PluginCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PluginInvoker for MockPluginInvoker {
    fn invoke(&self, call: PluginCall) -> BoxFuture<'_, Result<Value>> {
        self.calls.lock().unwrap().push(call);
        let response = self.response.clone();
        Box::pin(async move { Ok(response) })
    }
}

/// Event sink that keeps everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Event names in arrival order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WorkflowEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Loader over an in-memory map of documents.
#[derive(Default)]
pub struct MemoryDslLoader {
    flows: HashMap<String, WorkflowDsl>,
}

impl MemoryDslLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, id: impl Into<String>, dsl: WorkflowDsl) -> Self {
        self.flows.insert(id.into(), dsl);
        self
    }
}

impl DslLoader for MemoryDslLoader {
    fn load(&self, flow_id: &str) -> BoxFuture<'_, Result<WorkflowDsl>> {
        let found = self
            .flows
            .get(flow_id)
            .cloned()
            .ok_or_else(|| WeftError::WorkflowNotFound(flow_id.to_string()));
        Box::pin(async move { found })
    }
}
