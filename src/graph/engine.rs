use log::{debug, trace, warn};

use super::node::{GraphId, Node, NodeId};
use super::op::{Op, Operand, Upstream};
use super::topo;
use super::trace::Contribution;
use crate::config::TraceConfig;
use crate::error::{GradError, Result};

/// Arena that owns every node of one computation graph.
///
/// Operations append exactly one node and hand back its [`NodeId`]; operands are
/// referenced by handle, so a node can feed any number of later expressions and
/// can still be held directly by the caller (e.g. as a network weight). Dropping
/// the engine frees the whole graph at once.
#[derive(Debug)]
pub struct Engine {
    id: GraphId,
    nodes: Vec<Node>,
    config: TraceConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(TraceConfig::default())
    }

    pub fn with_config(config: TraceConfig) -> Self {
        Self {
            id: GraphId::next(),
            nodes: Vec::new(),
            config,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    // Creates a new leaf node in the computational graph
    pub fn leaf(&mut self, value: f64) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        trace!("{id}: leaf {value}");
        self.nodes.push(Node::leaf(id, value));
        id
    }

    pub fn leaf_with_label(&mut self, value: f64, label: impl Into<String>) -> NodeId {
        let id = self.leaf(value);
        self.nodes[id.index()].label = Some(label.into());
        id
    }

    /// One leaf per value, in order.
    pub fn leaves(&mut self, values: &[f64]) -> Vec<NodeId> {
        values.iter().map(|&v| self.leaf(v)).collect()
    }

    /// Fails if `id` was not issued by this engine.
    pub fn ensure_owned(&self, id: NodeId) -> Result<()> {
        if id.graph() != self.id {
            return Err(GradError::ForeignNode {
                node: id,
                owner: id.graph(),
                graph: self.id,
            });
        }
        if id.index() >= self.nodes.len() {
            return Err(GradError::NodeNotFound(id));
        }
        Ok(())
    }

    fn ensure_operand(&self, operand: Operand) -> Result<()> {
        match operand {
            Operand::Node(id) => self.ensure_owned(id),
            Operand::Literal(_) => Ok(()),
        }
    }

    /// Turns an operand into a handle, promoting a raw number to a new leaf.
    pub fn resolve(&mut self, operand: impl Into<Operand>) -> Result<NodeId> {
        match operand.into() {
            Operand::Node(id) => {
                self.ensure_owned(id)?;
                Ok(id)
            }
            Operand::Literal(value) => Ok(self.leaf(value)),
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.ensure_owned(id)?;
        Ok(&self.nodes[id.index()])
    }

    pub fn value(&self, id: NodeId) -> Result<f64> {
        Ok(self.node(id)?.value)
    }

    pub fn grad(&self, id: NodeId) -> Result<f64> {
        Ok(self.node(id)?.grad)
    }

    pub fn label(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.node(id)?.label())
    }

    /// Labels are cosmetic and may be set at any time.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        self.ensure_owned(id)?;
        self.nodes[id.index()].label = Some(label.into());
        Ok(())
    }

    // Appends the node produced by `op`. Operands must already be validated.
    fn push(&mut self, op: Op) -> NodeId {
        let value = op.compute(|operand| self.nodes[operand.index()].value);
        let id = NodeId::new(self.id, self.nodes.len());
        trace!("{id}: {} = {value}", op.name());
        self.nodes.push(Node::from_op(id, op, value));
        id
    }

    // Both operands are validated before any literal is promoted, so a failed
    // call never leaves stray leaves behind.
    fn binary(
        &mut self,
        a: Operand,
        b: Operand,
        make: impl FnOnce(NodeId, NodeId) -> Op,
    ) -> Result<NodeId> {
        self.ensure_operand(a)?;
        self.ensure_operand(b)?;
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        Ok(self.push(make(a, b)))
    }

    fn unary(&mut self, a: Operand, make: impl FnOnce(NodeId) -> Op) -> Result<NodeId> {
        let a = self.resolve(a)?;
        Ok(self.push(make(a)))
    }

    pub fn add(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        self.binary(a.into(), b.into(), Op::Add)
    }

    pub fn mul(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        self.binary(a.into(), b.into(), Op::Mul)
    }

    /// `a ^ exponent`. `0 ^ n` with `n < 1` yields a non-finite value or
    /// gradient, which is propagated as is.
    pub fn pow(&mut self, a: impl Into<Operand>, exponent: f64) -> Result<NodeId> {
        self.unary(a.into(), |base| Op::Pow { base, exponent })
    }

    pub fn relu(&mut self, a: impl Into<Operand>) -> Result<NodeId> {
        self.unary(a.into(), Op::ReLU)
    }

    pub fn exp(&mut self, a: impl Into<Operand>) -> Result<NodeId> {
        self.unary(a.into(), Op::Exp)
    }

    pub fn tanh(&mut self, a: impl Into<Operand>) -> Result<NodeId> {
        self.unary(a.into(), Op::Tanh)
    }

    /// `a * -1`
    pub fn neg(&mut self, a: impl Into<Operand>) -> Result<NodeId> {
        self.mul(a, -1.0)
    }

    /// `a + (-b)`
    pub fn sub(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        let a = a.into();
        self.ensure_operand(a)?;
        let neg_b = self.neg(b)?;
        self.add(a, neg_b)
    }

    /// `a * b^-1`
    pub fn div(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        let a = a.into();
        self.ensure_operand(a)?;
        let inv_b = self.pow(b, -1.0)?;
        self.mul(a, inv_b)
    }

    /// Every node reachable from `root`, each after all of its operands.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.ensure_owned(root)?;
        Ok(topo::topological_order(&self.nodes, root))
    }

    /// Resets every gradient in the arena to zero.
    pub fn zero_grad(&mut self) {
        for node in &mut self.nodes {
            node.grad = 0.0;
        }
    }

    /// Reverse-mode pass from `root`: seeds `root.grad = 1.0` and accumulates
    /// into every ancestor. Gradients are added, never overwritten, so calling
    /// this twice without [`Engine::zero_grad`] compounds them.
    pub fn backward(&mut self, root: NodeId) -> Result<()> {
        self.propagate(root, None)
    }

    /// Same traversal as [`Engine::backward`], also returning one
    /// [`Contribution`] per operand update, in the order they were applied.
    pub fn verbose_backward(&mut self, root: NodeId) -> Result<Vec<Contribution>> {
        let mut records = Vec::new();
        self.propagate(root, Some(&mut records))?;
        Ok(records)
    }

    fn propagate(&mut self, root: NodeId, mut records: Option<&mut Vec<Contribution>>) -> Result<()> {
        let order = self.topological_order(root)?;
        debug!("backward from {root}: {} reachable nodes", order.len());

        self.nodes[root.index()].grad = 1.0;

        for &node_id in order.iter().rev() {
            let node = &self.nodes[node_id.index()];
            let Some(op) = node.op else {
                continue; // Leaf nodes. The gradient stops here
            };
            let out = Upstream {
                value: node.value,
                grad: node.grad,
            };

            let steps: Vec<(NodeId, f64)> = op
                .local_gradients(out.value, |id| self.nodes[id.index()].value)
                .collect();

            // Every record of this node reads the gradients as they were before
            // any of its updates, so `x + x` describes both slots alike.
            if let Some(records) = records.as_deref_mut() {
                for (position, &(operand, _)) in steps.iter().enumerate() {
                    let description = op.describe(
                        position,
                        out,
                        self.nodes[operand.index()].grad,
                        |id| self.nodes[id.index()].value,
                        self.config.precision,
                    );
                    trace!("{node_id} -> {operand}: {description}");
                    records.push(Contribution {
                        source: node_id,
                        destination: operand,
                        description,
                    });
                }
            }

            for (operand, local) in steps {
                self.nodes[operand.index()].grad += local * out.grad;
            }
        }

        if let Some(bad) = order.iter().find(|id| !self.nodes[id.index()].grad.is_finite()) {
            warn!("backward from {root} produced a non-finite gradient at {bad}");
        }
        if let Some(records) = records {
            debug!("backward from {root}: {} contributions", records.len());
        }
        Ok(())
    }
}
