use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::info;

use weft_core::dsl::Node;
use weft_core::error::{Result, WeftError};
use weft_core::event::WorkflowEvent;
use weft_core::traits::PluginInvoker;
use weft_core::types::{value_as_i64, value_to_text, PluginCall};

use super::{NodeExecutor, NodeValues};
use crate::context::ExecutionContext;
use crate::graph::NodeKind;

/// Tool id of the voice synthesis plugin.
pub const VOICE_SYNTHESIS_TOOL: &str = "tool@8b2262bef821000";

const VOICE_URL: &str = "voice_url";

/// Dispatches plugin nodes on their `pluginId` parameter.
pub struct PluginExecutor {
    invoker: Arc<dyn PluginInvoker>,
    default_speed: i64,
}

impl PluginExecutor {
    pub fn new(invoker: Arc<dyn PluginInvoker>, default_speed: i64) -> Self {
        Self {
            invoker,
            default_speed,
        }
    }

    async fn voice_synthesis(
        &self,
        node: &Node,
        inputs: &NodeValues,
        ctx: &ExecutionContext,
    ) -> Result<NodeValues> {
        let text = input_text(inputs, "text")
            .or_else(|| input_text(inputs, "input"))
            .ok_or_else(|| WeftError::missing(&node.id, "text"))?;
        let vcn = input_text(inputs, "vcn")
            .or_else(|| node.data.param_str("vcn"))
            .ok_or_else(|| WeftError::missing(&node.id, "vcn"))?;
        let speed = inputs
            .get("speed")
            .and_then(value_as_i64)
            .unwrap_or(self.default_speed);
        let text_length = text.chars().count();

        info!(node_id = %node.id, vcn = %vcn, speed, text_length, "Voice synthesis");
        ctx.emit(WorkflowEvent::VoiceSynthesisStart {
            node_id: node.id.clone(),
            vcn: vcn.clone(),
            text_length,
        });

        let call = PluginCall {
            tool_id: VOICE_SYNTHESIS_TOOL.to_string(),
            operation_id: node.data.param_str("operationId").unwrap_or_default(),
            parameters: json!({"text": text, "vcn": vcn, "speed": speed}),
        };
        let response = self.invoker.invoke(call).await?;

        let voice_url = extract_voice_url(&response).ok_or_else(|| WeftError::Plugin {
            tool: VOICE_SYNTHESIS_TOOL.to_string(),
            message: format!("response has no voice_url: {response}"),
        })?;

        let mut outputs = NodeValues::new();
        outputs.insert(VOICE_URL.to_string(), Value::String(voice_url));
        Ok(outputs)
    }
}

impl NodeExecutor for PluginExecutor {
    fn kind(&self) -> NodeKind {
        NodeKind::Plugin
    }

    fn execute<'a>(
        &'a self,
        node: &'a Node,
        inputs: NodeValues,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<NodeValues>> {
        Box::pin(async move {
            let plugin_id = node
                .data
                .param_str("pluginId")
                .ok_or_else(|| WeftError::missing(&node.id, "pluginId"))?;

            match plugin_id.as_str() {
                VOICE_SYNTHESIS_TOOL => self.voice_synthesis(node, &inputs, ctx).await,
                _ => Err(WeftError::UnsupportedPlugin(plugin_id)),
            }
        })
    }
}

/// A non-null input rendered as text.
fn input_text(inputs: &NodeValues, name: &str) -> Option<String> {
    inputs
        .get(name)
        .filter(|v| !v.is_null())
        .map(value_to_text)
}

/// `voice_url` from `data.voice_url`, else from the top level.
pub fn extract_voice_url(response: &Value) -> Option<String> {
    response
        .get("data")
        .and_then(|d| d.get(VOICE_URL))
        .or_else(|| response.get(VOICE_URL))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use weft_core::event::EventBus;

    struct Capture {
        calls: Mutex<Vec<PluginCall>>,
        response: Value,
    }

    impl PluginInvoker for Capture {
        fn invoke(&self, call: PluginCall) -> BoxFuture<'_, Result<Value>> {
            self.calls.lock().unwrap().push(call);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn setup(response: Value) -> (Arc<Capture>, PluginExecutor, ExecutionContext) {
        let invoker = Arc::new(Capture {
            calls: Mutex::new(Vec::new()),
            response,
        });
        let exec = PluginExecutor::new(invoker.clone(), 50);
        let ctx = ExecutionContext::new(NodeValues::new(), Arc::new(EventBus::default()));
        (invoker, exec, ctx)
    }

    fn voice_node() -> Node {
        Node::new("node-plugin::003")
            .with_param("pluginId", json!(VOICE_SYNTHESIS_TOOL))
            .with_param("operationId", json!("synth-46EXFdLW"))
            .with_param("vcn", json!("x5_lingfeiyi_flow"))
    }

    #[test]
    fn test_extract_voice_url() {
        assert_eq!(
            extract_voice_url(&json!({"data": {"voice_url": "http://a"}})),
            Some("http://a".into())
        );
        assert_eq!(
            extract_voice_url(&json!({"voice_url": "http://b"})),
            Some("http://b".into())
        );
        assert_eq!(extract_voice_url(&json!({"data": {}})), None);
    }

    #[tokio::test]
    async fn test_voice_synthesis_call() {
        let (invoker, exec, ctx) = setup(json!({"code": 0, "data": {"voice_url": "http://minio/a.mp3"}}));
        let mut inputs = NodeValues::new();
        inputs.insert("input".into(), json!("hello there"));
        inputs.insert("speed".into(), json!("60"));

        let out = exec.execute(&voice_node(), inputs, &ctx).await.unwrap();
        assert_eq!(out["voice_url"], json!("http://minio/a.mp3"));

        let call = &invoker.calls.lock().unwrap()[0];
        assert_eq!(call.tool_id, VOICE_SYNTHESIS_TOOL);
        assert_eq!(call.operation_id, "synth-46EXFdLW");
        assert_eq!(
            call.parameters,
            json!({"text": "hello there", "vcn": "x5_lingfeiyi_flow", "speed": 60})
        );
    }

    #[tokio::test]
    async fn test_input_vcn_and_default_speed() {
        let (invoker, exec, ctx) = setup(json!({"voice_url": "u"}));
        let mut inputs = NodeValues::new();
        inputs.insert("text".into(), json!("t"));
        inputs.insert("input".into(), json!("ignored"));
        inputs.insert("vcn".into(), json!("x4_other"));

        exec.execute(&voice_node(), inputs, &ctx).await.unwrap();
        let call = &invoker.calls.lock().unwrap()[0];
        assert_eq!(call.parameters["vcn"], "x4_other");
        assert_eq!(call.parameters["text"], "t");
        assert_eq!(call.parameters["speed"], 50);
    }

    #[tokio::test]
    async fn test_unsupported_plugin() {
        let (invoker, exec, ctx) = setup(json!({}));
        let node = Node::new("node-plugin::003").with_param("pluginId", json!("tool@unknown"));
        let err = exec.execute(&node, NodeValues::new(), &ctx).await.unwrap_err();
        assert!(matches!(err, WeftError::UnsupportedPlugin(ref id) if id == "tool@unknown"));
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_text() {
        let (_, exec, ctx) = setup(json!({}));
        let err = exec.execute(&voice_node(), NodeValues::new(), &ctx).await.unwrap_err();
        assert!(matches!(err, WeftError::MissingParameter { ref name, .. } if name == "text"));
    }

    #[tokio::test]
    async fn test_response_without_url() {
        let (_, exec, ctx) = setup(json!({"data": {"status": "queued"}}));
        let mut inputs = NodeValues::new();
        inputs.insert("text".into(), json!("t"));
        let err = exec.execute(&voice_node(), inputs, &ctx).await.unwrap_err();
        assert!(matches!(err, WeftError::Plugin { .. }));
    }
}
