use futures::future::BoxFuture;

use weft_core::dsl::Node;
use weft_core::error::Result;

use super::{NodeExecutor, NodeValues};
use crate::context::ExecutionContext;
use crate::graph::NodeKind;

/// Re-exposes the caller's inputs under the start node's id, overlaid by any
/// declared start inputs.
pub struct StartExecutor;

impl NodeExecutor for StartExecutor {
    fn kind(&self) -> NodeKind {
        NodeKind::Start
    }

    fn execute<'a>(
        &'a self,
        _node: &'a Node,
        inputs: NodeValues,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<NodeValues>> {
        Box::pin(async move {
            let mut outputs = ctx.initial_inputs.clone();
            outputs.extend(inputs);
            Ok(outputs)
        })
    }
}
