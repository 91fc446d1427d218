use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use weft_core::dsl::Node;
use weft_core::error::Result;
use weft_core::types::value_to_text;

use super::{NodeExecutor, NodeValues};
use crate::context::ExecutionContext;
use crate::graph::NodeKind;

/// Output name of the end node.
pub const FINAL_OUTPUT: &str = "final_output";

/// `outputMode` value for template rendering.
const MODE_TEMPLATE: i64 = 1;

/// Produces `final_output`: the rendered `template` in template mode,
/// otherwise one `name: value` line per resolved input.
pub struct EndExecutor;

impl NodeExecutor for EndExecutor {
    fn kind(&self) -> NodeKind {
        NodeKind::End
    }

    fn execute<'a>(
        &'a self,
        node: &'a Node,
        inputs: NodeValues,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<NodeValues>> {
        Box::pin(async move {
            let mode = node.data.param_i64("outputMode").unwrap_or(MODE_TEMPLATE);
            let template = node.data.param_str("template").unwrap_or_default();

            let output = if mode == MODE_TEMPLATE && !template.is_empty() {
                ctx.variables.resolve(&template)
            } else {
                debug!(node_id = %node.id, mode, "Dumping inputs");
                inputs
                    .iter()
                    .map(|(name, value)| format!("{name}: {}\n", value_to_text(value)))
                    .collect()
            };

            let mut outputs = NodeValues::new();
            outputs.insert(FINAL_OUTPUT.to_string(), Value::String(output));
            Ok(outputs)
        })
    }
}
