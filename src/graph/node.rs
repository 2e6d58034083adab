use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Serialize, Serializer};

use super::op::Op;

// Unique ID generator for computation graphs (arenas).
static GRAPH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Identity of one arena. Every [`NodeId`] remembers the arena that issued it,
/// which is how handles from another graph are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(usize);

impl GraphId {
    pub(crate) fn next() -> Self {
        // Relaxed is enough: we only need uniqueness, not ordering with other memory.
        Self(GRAPH_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Handle to a node inside an [`Engine`](super::Engine) arena.
///
/// Handles are cheap to copy and compare by identity: two nodes holding the
/// same value are still different vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    graph: GraphId,
    index: usize,
}

impl NodeId {
    pub(crate) fn new(graph: GraphId, index: usize) -> Self {
        Self { graph, index }
    }

    /// The arena this handle was issued by.
    pub fn graph(&self) -> GraphId {
        self.graph
    }

    /// Position of the node in its arena. Operands always have a smaller index
    /// than the nodes built from them.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index)
    }
}

// Visualization layers key their nodes by string, so the handle is serialized
// the same way it is displayed.
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A vertex of the computation graph.
///
/// `value` is fixed at creation. `grad` starts at zero and is only ever
/// accumulated into by a backward pass (the root is seeded to 1.0).
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) value: f64,
    pub(crate) grad: f64,
    pub(crate) op: Option<Op>, // None for leaves (inputs, parameters, promoted literals)
    pub(crate) label: Option<String>,
}

impl Node {
    pub(crate) fn leaf(id: NodeId, value: f64) -> Self {
        Self {
            id,
            value,
            grad: 0.0,
            op: None,
            label: None,
        }
    }

    pub(crate) fn from_op(id: NodeId, op: Op, value: f64) -> Self {
        Self {
            id,
            value,
            grad: 0.0,
            op: Some(op),
            label: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn grad(&self) -> f64 {
        self.grad
    }

    /// The operation that produced this node, `None` for leaves.
    pub fn op(&self) -> Option<&Op> {
        self.op.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.op.is_none()
    }

    /// Operand handles in order: none for leaves, one for unary ops, two for binary ops.
    pub fn operands(&self) -> Vec<NodeId> {
        self.op.map(|op| op.operands().collect()).unwrap_or_default()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value(value={}, grad={})", self.value, self.grad)
    }
}
