//! Read-only data products for an external visualization layer.
//!
//! Nothing here is read back by the engine: a [`GraphTrace`] is a snapshot of
//! the nodes and edges reachable from a root, a [`VisualGraph`] is the same
//! snapshot with one extra vertex per operation (the shape a layered layout
//! expects), and [`Contribution`]s are the step-by-step record of a verbose
//! backward pass.
use serde::Serialize;

use super::engine::Engine;
use super::node::NodeId;
use crate::error::Result;

/// One gradient update applied during a verbose backward pass: the node at
/// `source` pushed gradient into its operand `destination`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub source: NodeId,
    pub destination: NodeId,
    pub description: String,
}

/// Snapshot of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub value: f64,
    pub grad: f64,
    pub label: Option<String>,
    /// Operation symbol, `None` for leaves.
    pub op: Option<String>,
}

/// Operand -> result edge. `position` distinguishes the two slots of `x * x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphTrace {
    pub root: Option<NodeId>,
    /// Topological order: operands before results.
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<Edge>,
}

impl GraphTrace {
    pub fn node(&self, id: NodeId) -> Option<&NodeSummary> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualNode {
    Value {
        id: String,
        value: f64,
        grad: f64,
        label: Option<String>,
    },
    Operator {
        id: String,
        op: String,
    },
}

impl VisualNode {
    pub fn id(&self) -> &str {
        match self {
            VisualNode::Value { id, .. } | VisualNode::Operator { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualEdge {
    pub source: String,
    pub target: String,
}

/// Value vertices plus one operator vertex per non-leaf node, wired
/// `operand -> operator -> result`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    /// Id of the operator vertex attached to `node`.
    pub fn operator_id(node: NodeId, op: &str) -> String {
        format!("{node}:{op}")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&GraphTrace> for VisualGraph {
    fn from(trace: &GraphTrace) -> Self {
        let mut graph = VisualGraph::default();

        for summary in &trace.nodes {
            let value_id = summary.id.to_string();
            graph.nodes.push(VisualNode::Value {
                id: value_id.clone(),
                value: summary.value,
                grad: summary.grad,
                label: summary.label.clone(),
            });

            if let Some(op) = &summary.op {
                let op_id = VisualGraph::operator_id(summary.id, op);
                graph.nodes.push(VisualNode::Operator {
                    id: op_id.clone(),
                    op: op.clone(),
                });
                for edge in trace.edges.iter().filter(|e| e.to == summary.id) {
                    graph.edges.push(VisualEdge {
                        source: edge.from.to_string(),
                        target: op_id.clone(),
                    });
                }
                graph.edges.push(VisualEdge {
                    source: op_id,
                    target: value_id,
                });
            }
        }

        graph
    }
}

/// Serializes a contribution trace for an animation layer.
pub fn contributions_to_json(records: &[Contribution]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

impl Engine {
    /// Nodes and edges reachable from `root`.
    pub fn trace(&self, root: NodeId) -> Result<GraphTrace> {
        let order = self.topological_order(root)?;
        let mut trace = GraphTrace {
            root: Some(root),
            ..GraphTrace::default()
        };

        for id in order {
            let node = self.node(id)?;
            trace.nodes.push(NodeSummary {
                id,
                value: node.value(),
                grad: node.grad(),
                label: node.label().map(str::to_string),
                op: node.op().map(|op| op.symbol()),
            });
            for (position, from) in node.operands().into_iter().enumerate() {
                trace.edges.push(Edge {
                    from,
                    to: id,
                    position,
                });
            }
        }

        Ok(trace)
    }
}
