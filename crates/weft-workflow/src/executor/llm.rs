use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::info;

use weft_core::dsl::Node;
use weft_core::error::{Result, WeftError};
use weft_core::event::WorkflowEvent;
use weft_core::traits::ChatModel;
use weft_core::types::{ChatMessage, ChatRequest};

use super::{NodeExecutor, NodeValues};
use crate::context::ExecutionContext;
use crate::graph::NodeKind;

const DEFAULT_TEMPERATURE: f64 = 0.5;
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_OUTPUT_NAME: &str = "llm_output";

/// Renders the node's prompt template against the store and sends it to the
/// chat model as a single user message.
pub struct LlmExecutor {
    model: Arc<dyn ChatModel>,
    default_domain: String,
}

impl LlmExecutor {
    pub fn new(model: Arc<dyn ChatModel>, default_domain: impl Into<String>) -> Self {
        Self {
            model,
            default_domain: default_domain.into(),
        }
    }

    fn build_request(&self, node: &Node, prompt: String) -> ChatRequest {
        let params = &node.data;
        ChatRequest {
            domain: params
                .param_str("domain")
                .or_else(|| params.param_str("model"))
                .unwrap_or_else(|| self.default_domain.clone()),
            temperature: params.param_f64("temperature").unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: params
                .param_i64("maxTokens")
                .or_else(|| params.param_i64("max_tokens"))
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![ChatMessage::user(prompt)],
        }
    }
}

impl NodeExecutor for LlmExecutor {
    fn kind(&self) -> NodeKind {
        NodeKind::Llm
    }

    fn execute<'a>(
        &'a self,
        node: &'a Node,
        _inputs: NodeValues,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<NodeValues>> {
        Box::pin(async move {
            let template = node
                .data
                .param_str("prompt")
                .or_else(|| node.data.param_str("template"))
                .ok_or_else(|| WeftError::missing(&node.id, "prompt"))?;

            let prompt = ctx.variables.resolve(&template);
            ctx.emit(WorkflowEvent::LlmThinking {
                node_id: node.id.clone(),
                prompt: prompt.clone(),
            });

            let request = self.build_request(node, prompt);
            info!(
                node_id = %node.id,
                model = %self.model.name(),
                domain = %request.domain,
                temperature = request.temperature,
                max_tokens = request.max_tokens,
                "Calling chat model"
            );

            let reply = self.model.chat(request).await?;

            let output_name = node
                .data
                .outputs
                .first()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string());

            let mut outputs = NodeValues::new();
            outputs.insert(output_name, Value::String(reply));
            Ok(outputs)
        })
    }
}
