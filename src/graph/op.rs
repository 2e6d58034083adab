// op.rs
// Every primitive is a variant of `Op`. A variant carries its operand handles
// (and the exponent for `Pow`), so one node stores everything the backward pass
// needs and the rule table below stays a plain `match`.
use std::iter::{Chain, Once, once};
use std::option;

use super::node::NodeId;

/// Operand handles of an operation, in order.
pub type Operands = Chain<Once<NodeId>, option::IntoIter<NodeId>>;

/// `(operand, d out / d operand)` pairs produced by [`Op::local_gradients`].
pub type LocalGradients = Chain<Once<(NodeId, f64)>, option::IntoIter<(NodeId, f64)>>;

/// The primitive that produced a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add(NodeId, NodeId),
    Mul(NodeId, NodeId),
    /// `base ^ exponent`; the exponent is a plain number, not a node.
    Pow { base: NodeId, exponent: f64 },
    ReLU(NodeId),
    Exp(NodeId),
    Tanh(NodeId),
}

/// Argument accepted by every engine operation: an existing node or a raw
/// number that gets promoted to a fresh leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Literal(f64),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Node(id)
    }
}

impl From<&NodeId> for Operand {
    fn from(id: &NodeId) -> Self {
        Operand::Node(*id)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Literal(value)
    }
}

/// Value and gradient of the node whose rule is being applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upstream {
    pub value: f64,
    pub grad: f64,
}

impl Op {
    /// Stable lowercase name, used in logs and visual-graph ids.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add(..) => "add",
            Op::Mul(..) => "mul",
            Op::Pow { .. } => "pow",
            Op::ReLU(_) => "relu",
            Op::Exp(_) => "exp",
            Op::Tanh(_) => "tanh",
        }
    }

    /// Short tag shown on operator vertices (`+`, `*`, `**2`, `ReLU`, `exp`, `tanh`).
    pub fn symbol(&self) -> String {
        match self {
            Op::Add(..) => "+".to_string(),
            Op::Mul(..) => "*".to_string(),
            Op::Pow { exponent, .. } => format!("**{exponent}"),
            Op::ReLU(_) => "ReLU".to_string(),
            Op::Exp(_) => "exp".to_string(),
            Op::Tanh(_) => "tanh".to_string(),
        }
    }

    pub fn arity(&self) -> usize {
        match self.operand_pair() {
            (_, Some(_)) => 2,
            (_, None) => 1,
        }
    }

    pub fn operands(&self) -> Operands {
        let (first, second) = self.operand_pair();
        once(first).chain(second)
    }

    fn operand_pair(&self) -> (NodeId, Option<NodeId>) {
        match *self {
            Op::Add(a, b) | Op::Mul(a, b) => (a, Some(b)),
            Op::Pow { base, .. } => (base, None),
            Op::ReLU(a) | Op::Exp(a) | Op::Tanh(a) => (a, None),
        }
    }

    /// Forward result given the values of the operands.
    pub fn compute(&self, value_of: impl Fn(NodeId) -> f64) -> f64 {
        match *self {
            Op::Add(a, b) => value_of(a) + value_of(b),
            Op::Mul(a, b) => value_of(a) * value_of(b),
            Op::Pow { base, exponent } => value_of(base).powf(exponent),
            Op::ReLU(a) => {
                let x = value_of(a);
                if x < 0.0 { 0.0 } else { x }
            }
            Op::Exp(a) => value_of(a).exp(),
            Op::Tanh(a) => value_of(a).tanh(),
        }
    }

    /// Local derivative of the output with respect to each operand.
    ///
    /// The backward pass adds `local * out.grad` to every operand. `out_value`
    /// is the forward result of this node; values never change after creation,
    /// so the rule always sees the numbers the forward pass used.
    pub fn local_gradients(&self, out_value: f64, value_of: impl Fn(NodeId) -> f64) -> LocalGradients {
        let (first, second) = match *self {
            Op::Add(a, b) => ((a, 1.0), Some((b, 1.0))),
            Op::Mul(a, b) => ((a, value_of(b)), Some((b, value_of(a)))),
            Op::Pow { base, exponent } => {
                ((base, exponent * value_of(base).powf(exponent - 1.0)), None)
            }
            // Sub-gradient at the kink is 0.
            Op::ReLU(a) => ((a, if out_value > 0.0 { 1.0 } else { 0.0 }), None),
            Op::Exp(a) => ((a, out_value), None),
            Op::Tanh(a) => ((a, 1.0 - out_value * out_value), None),
        };
        once(first).chain(second)
    }

    /// Human-readable arithmetic for the update pushed to the operand at
    /// `position`. Purely cosmetic; `operand_grad` is the operand's gradient
    /// before the update.
    pub fn describe(
        &self,
        position: usize,
        out: Upstream,
        operand_grad: f64,
        value_of: impl Fn(NodeId) -> f64,
        precision: usize,
    ) -> String {
        let p = precision;
        let g = out.grad;
        match *self {
            Op::Add(..) => format!("{operand_grad:.p$}+{g:.p$}"),
            Op::Mul(a, b) => {
                let other = if position == 0 { b } else { a };
                format!("{:.p$}*{g:.p$}", value_of(other))
            }
            Op::Pow { base, exponent } => {
                format!("{exponent}*{:.p$}^({exponent}-1)*{g:.p$}", value_of(base))
            }
            Op::ReLU(_) => format!("{}*{g:.p$}", u8::from(out.value > 0.0)),
            Op::Exp(_) => format!("{:.p$}*{g:.p$}", out.value),
            Op::Tanh(_) => format!("(1-{:.p$}^2)*{g:.p$}", out.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::GraphId;
    use approx::assert_abs_diff_eq;

    fn ids() -> (NodeId, NodeId) {
        let graph = GraphId::next();
        (NodeId::new(graph, 0), NodeId::new(graph, 1))
    }

    fn values(a: NodeId, va: f64, vb: f64) -> impl Fn(NodeId) -> f64 {
        move |id| if id == a { va } else { vb }
    }

    #[test]
    fn test_operands_and_arity() {
        let (a, b) = ids();
        assert_eq!(Op::Mul(a, b).operands().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(Op::Tanh(b).operands().collect::<Vec<_>>(), vec![b]);
        assert_eq!(Op::Add(a, a).arity(), 2);
        assert_eq!(Op::Pow { base: a, exponent: 3.0 }.arity(), 1);
    }

    #[test]
    fn test_compute_rules() {
        let (a, b) = ids();
        let v = values(a, 2.0, -3.0);
        assert_eq!(Op::Add(a, b).compute(&v), -1.0);
        assert_eq!(Op::Mul(a, b).compute(&v), -6.0);
        assert_eq!(Op::Pow { base: a, exponent: 3.0 }.compute(&v), 8.0);
        assert_eq!(Op::ReLU(b).compute(&v), 0.0);
        assert_eq!(Op::ReLU(a).compute(&v), 2.0);
        assert_abs_diff_eq!(Op::Exp(a).compute(&v), 2.0f64.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(Op::Tanh(a).compute(&v), 2.0f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn test_local_gradient_rules() {
        let (a, b) = ids();
        let v = values(a, 2.0, -3.0);

        let mul: Vec<_> = Op::Mul(a, b).local_gradients(-6.0, &v).collect();
        assert_eq!(mul, vec![(a, -3.0), (b, 2.0)]);

        let add: Vec<_> = Op::Add(a, b).local_gradients(-1.0, &v).collect();
        assert_eq!(add, vec![(a, 1.0), (b, 1.0)]);

        // d/dx x^3 = 3x^2 = 12 at x = 2
        let pow: Vec<_> = Op::Pow { base: a, exponent: 3.0 }.local_gradients(8.0, &v).collect();
        assert_eq!(pow, vec![(a, 12.0)]);

        let relu: Vec<_> = Op::ReLU(b).local_gradients(0.0, &v).collect();
        assert_eq!(relu, vec![(b, 0.0)]);

        let t = 2.0f64.tanh();
        let tanh: Vec<_> = Op::Tanh(a).local_gradients(t, &v).collect();
        assert_abs_diff_eq!(tanh[0].1, 1.0 - t * t, epsilon = 1e-12);

        let e = 2.0f64.exp();
        let exp: Vec<_> = Op::Exp(a).local_gradients(e, &v).collect();
        assert_eq!(exp, vec![(a, e)]);
    }

    #[test]
    fn test_pow_at_zero_is_not_clamped() {
        let (a, _) = ids();
        let v = values(a, 0.0, 0.0);
        let op = Op::Pow { base: a, exponent: -1.0 };
        assert!(op.compute(&v).is_infinite());
        let local: Vec<_> = op.local_gradients(f64::INFINITY, &v).collect();
        assert!(!local[0].1.is_finite());
    }

    #[test]
    fn test_describe_mul_uses_other_operand() {
        let (a, b) = ids();
        let v = values(a, 2.0, -3.0);
        let out = Upstream { value: -6.0, grad: 1.0 };
        assert_eq!(Op::Mul(a, b).describe(0, out, 0.0, &v, 2), "-3.00*1.00");
        assert_eq!(Op::Mul(a, b).describe(1, out, 0.0, &v, 2), "2.00*1.00");
        assert_eq!(Op::ReLU(a).describe(0, Upstream { value: 2.0, grad: 0.5 }, 0.0, &v, 1), "1*0.5");
    }

    #[test]
    fn test_symbols() {
        let (a, b) = ids();
        assert_eq!(Op::Add(a, b).symbol(), "+");
        assert_eq!(Op::Pow { base: a, exponent: 2.0 }.symbol(), "**2");
        assert_eq!(Op::ReLU(a).symbol(), "ReLU");
        assert_eq!(Op::Tanh(a).name(), "tanh");
    }
}
