//! Validated workflow graph.
//!
//! A [`WorkflowDsl`] becomes a [`Graph`] once every node has been given a
//! [`NodeKind`]. The kind comes from the identifier prefix (`node-llm::002`
//! is an LLM node); the declared `nodeMeta.nodeType`, when it names a known
//! kind, must agree. A node whose type is unknown is kept unresolved; it
//! only fails if the walk reaches it.
//!
//! Execution is a single-path walk: from the start node, follow the first
//! outgoing edge of each node until a node has none, a node repeats, or an
//! edge points at a missing node.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use weft_core::dsl::{Edge, Node, WorkflowDsl};
use weft_core::error::{Result, WeftError};

/// The executable node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Start,
    Llm,
    Plugin,
    End,
}

/// Every accepted type name, including legacy aliases.
const KIND_ALIASES: &[(&str, NodeKind)] = &[
    ("node-start", NodeKind::Start),
    ("start", NodeKind::Start),
    ("node-llm", NodeKind::Llm),
    ("spark-llm", NodeKind::Llm),
    ("node-plugin", NodeKind::Plugin),
    ("plugin", NodeKind::Plugin),
    ("node-end", NodeKind::End),
    ("end", NodeKind::End),
];

impl NodeKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        KIND_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, kind)| *kind)
    }

    /// Canonical type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "node-start",
            Self::Llm => "node-llm",
            Self::Plugin => "node-plugin",
            Self::End => "node-end",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document node with its resolved kind.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub node: Node,
    /// `None` when neither the id prefix nor the metadata names a known kind.
    /// Such a node only fails once the engine reaches it.
    pub kind: Option<NodeKind>,
}

impl GraphNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Canonical kind name, or the raw type name of an unresolved node.
    pub fn type_label(&self) -> &str {
        match self.kind {
            Some(kind) => kind.as_str(),
            None => self.node.type_name(),
        }
    }
}

/// An immutable, validated workflow graph.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Resolve node kinds and validate the document.
    pub fn from_dsl(dsl: WorkflowDsl) -> Result<Self> {
        let mut nodes = Vec::with_capacity(dsl.nodes.len());
        let mut index = HashMap::with_capacity(dsl.nodes.len());

        for node in dsl.nodes {
            let kind = resolve_kind(&node)?;
            if index.insert(node.id.clone(), nodes.len()).is_some() {
                return Err(WeftError::Dsl(format!("duplicate node id '{}'", node.id)));
            }
            nodes.push(GraphNode { node, kind });
        }

        debug!(nodes = nodes.len(), edges = dsl.edges.len(), "Graph loaded");
        Ok(Self {
            nodes,
            index,
            edges: dsl.edges,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_dsl(WorkflowDsl::from_json(text)?)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Edges leaving `id`, in document order.
    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source_node_id == id)
    }

    /// The entry node. With several start nodes the first in document order
    /// wins.
    pub fn start_node(&self) -> Result<&GraphNode> {
        let mut starts = self
            .nodes
            .iter()
            .filter(|n| n.kind == Some(NodeKind::Start));
        let first = starts.next().ok_or(WeftError::NoStartNode)?;
        let extra = starts.count();
        if extra > 0 {
            warn!(node_id = %first.id(), ignored = extra, "Multiple start nodes, using the first");
        }
        Ok(first)
    }

    /// Linear execution order starting at the start node.
    pub fn execution_order(&self) -> Result<Vec<&GraphNode>> {
        let mut current = self.start_node()?;
        let mut order = Vec::new();
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(current.id()) {
                warn!(node_id = %current.id(), "Cycle detected, truncating execution order");
                break;
            }
            order.push(current);

            let mut outgoing = self.outgoing_edges(current.id());
            let Some(edge) = outgoing.next() else {
                break;
            };
            let dropped = outgoing.count();
            if dropped > 0 {
                debug!(
                    node_id = %current.id(),
                    dropped,
                    "Following first outgoing edge only"
                );
            }

            match self.find_node(&edge.target_node_id) {
                Some(next) => current = next,
                None => {
                    warn!(
                        source = %edge.source_node_id,
                        target = %edge.target_node_id,
                        "Edge target not found, ending execution order"
                    );
                    break;
                }
            }
        }

        Ok(order)
    }
}

fn resolve_kind(node: &Node) -> Result<Option<NodeKind>> {
    let id_kind = NodeKind::from_type_name(node.type_name());
    let meta_kind = node.meta_type().and_then(NodeKind::from_type_name);

    match (id_kind, meta_kind) {
        (Some(a), Some(b)) if a != b => Err(WeftError::NodeTypeMismatch {
            node_id: node.id.clone(),
            id_type: node.type_name().to_string(),
            meta_type: node.meta_type().unwrap_or_default().to_string(),
        }),
        (Some(kind), _) | (None, Some(kind)) => Ok(Some(kind)),
        (None, None) => {
            debug!(node_id = %node.id, type_name = node.type_name(), "Unknown node type");
            Ok(None)
        }
    }
}
