//! Workflow document model, as stored by the console and returned by a
//! [`DslLoader`](crate::traits::DslLoader).
//!
//! ```json
//! { "nodes": [ {"id": "node-start::001", "data": {...}} ],
//!   "edges": [ {"sourceNodeId": "...", "targetNodeId": "...", "sourceHandle": null} ] }
//! ```
//!
//! These types are a faithful mirror of the document. Validation and kind
//! resolution happen in `weft-workflow` when the document becomes a graph.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

/// Separator between a node's type name and its sequence number.
pub const NODE_ID_SEPARATOR: &str = "::";

/// A complete workflow document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDsl {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowDsl {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| WeftError::Dsl(e.to_string()))
    }

    /// Find a node by id.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All edges leaving `source_id`, in document order.
    pub fn outgoing_edges<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source_node_id == source_id)
    }
}

/// A node in the workflow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Conventionally `"<type>::<sequence>"`, e.g. `node-llm::002`.
    pub id: String,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: NodeData::default(),
        }
    }

    /// Type name derived from the identifier prefix.
    ///
    /// An identifier without a separator is its own type name.
    pub fn type_name(&self) -> &str {
        self.id
            .split_once(NODE_ID_SEPARATOR)
            .map(|(prefix, _)| prefix)
            .unwrap_or(&self.id)
    }

    /// Type declared in `nodeMeta`, if any.
    pub fn meta_type(&self) -> Option<&str> {
        self.data
            .node_meta
            .as_ref()
            .and_then(|m| m.node_type.as_deref())
    }

    /// Human-readable name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.data
            .node_meta
            .as_ref()
            .and_then(|m| m.alias_name.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn with_input(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.data.inputs.push(InputItem::new(name, value));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.node_param.insert(key.into(), value);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.data.outputs.push(OutputItem::new(name));
        self
    }

    pub fn with_meta(mut self, node_type: impl Into<String>, alias_name: impl Into<String>) -> Self {
        self.data.node_meta = Some(NodeMeta {
            node_type: Some(node_type.into()),
            alias_name: Some(alias_name.into()),
        });
        self
    }
}

/// Per-node configuration block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub inputs: Vec<InputItem>,
    #[serde(default)]
    pub node_meta: Option<NodeMeta>,
    /// Open, type-specific parameter map.
    #[serde(default)]
    pub node_param: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub outputs: Vec<OutputItem>,
}

impl NodeData {
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.node_param.get(key).filter(|v| !v.is_null())
    }

    /// A parameter rendered as text. Numbers and booleans are stringified.
    pub fn param_str(&self, key: &str) -> Option<String> {
        self.param(key).map(crate::types::value_to_text)
    }

    /// A numeric parameter; numeric strings are accepted.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(crate::types::value_as_f64)
    }

    /// An integer parameter; numeric strings are accepted.
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(crate::types::value_as_i64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub alias_name: Option<String>,
}

/// A declared node input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub schema: Option<InputSchema>,
}

impl InputItem {
    pub fn new(name: impl Into<String>, value: InputValue) -> Self {
        Self {
            id: None,
            name: name.into(),
            schema: Some(InputSchema {
                value_type: Some("string".to_string()),
                value: Some(value),
            }),
        }
    }

    /// The bound value, if the schema carries one.
    pub fn value(&self) -> Option<&InputValue> {
        self.schema.as_ref().and_then(|s| s.value.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    /// Declared data type: "string", "integer", "number", "boolean", "array", "object".
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Option<InputValue>,
}

/// An input binding: either an embedded constant or a reference to another
/// node's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum InputValue {
    Literal(serde_json::Value),
    Ref(NodeRef),
}

impl InputValue {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(node_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Ref(NodeRef {
            node_id: node_id.into(),
            name: name.into(),
        })
    }
}

/// Points at `(node_id, name)` in the variable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub node_id: String,
    pub name: String,
}

impl NodeRef {
    /// The placeholder text a template uses for this reference: `{{id.name}}`.
    pub fn placeholder(&self) -> String {
        format!("{{{{{}.{}}}}}", self.node_id, self.name)
    }
}

/// A declared node output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub schema: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub required: bool,
}

impl OutputItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            schema: None,
            required: false,
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_node_id: String,
    pub target_node_id: String,
    /// Output name on the source node, if the editor recorded one.
    #[serde(default)]
    pub source_handle: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_node_id: source.into(),
            target_node_id: target.into(),
            source_handle: None,
        }
    }
}
