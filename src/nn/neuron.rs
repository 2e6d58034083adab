use rand::Rng;

use crate::error::{GradError, Result};
use crate::graph::{Engine, NodeId};
use crate::initializers::UniformInit;
use crate::nn::Module;

/// `tanh(w · x + b)` over scalar nodes.
#[derive(Debug, Clone)]
pub struct Neuron {
    weights: Vec<NodeId>,
    bias: NodeId,
}

impl Neuron {
    /// Allocates `fan_in` weights and one bias in `graph`, sampled from `init`.
    pub fn new<R: Rng + ?Sized>(
        graph: &mut Engine,
        fan_in: usize,
        init: &UniformInit,
        rng: &mut R,
    ) -> Self {
        let weights = (0..fan_in).map(|_| graph.leaf(init.sample(rng))).collect();
        let bias = graph.leaf(init.sample(rng));
        Self { weights, bias }
    }

    /// Builds a neuron around existing parameter nodes, e.g. hand-picked weights.
    pub fn from_parameters(graph: &Engine, weights: Vec<NodeId>, bias: NodeId) -> Result<Self> {
        for &id in weights.iter().chain(std::iter::once(&bias)) {
            graph.ensure_owned(id)?;
        }
        Ok(Self { weights, bias })
    }

    pub fn weights(&self) -> &[NodeId] {
        &self.weights
    }

    pub fn bias(&self) -> NodeId {
        self.bias
    }

    pub fn fan_in(&self) -> usize {
        self.weights.len()
    }

    /// Single activation node for `inputs`.
    ///
    /// Fails before allocating anything if the input count differs from the
    /// weight count or any node belongs to another graph.
    pub fn output(&self, graph: &mut Engine, inputs: &[NodeId]) -> Result<NodeId> {
        if inputs.len() != self.weights.len() {
            return Err(GradError::ShapeMismatch {
                expected: self.weights.len(),
                actual: inputs.len(),
                context: "Neuron::output".to_string(),
            });
        }
        for &id in inputs.iter().chain(&self.weights).chain(std::iter::once(&self.bias)) {
            graph.ensure_owned(id)?;
        }

        let mut act: Option<NodeId> = None;
        for (&x, &w) in inputs.iter().zip(&self.weights) {
            let xw = graph.mul(x, w)?;
            act = Some(match act {
                Some(sum) => graph.add(sum, xw)?,
                None => xw,
            });
        }
        let pre_activation = match act {
            Some(sum) => graph.add(sum, self.bias)?,
            None => self.bias,
        };
        graph.tanh(pre_activation)
    }
}

impl Module for Neuron {
    fn forward(&self, graph: &mut Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        Ok(vec![self.output(graph, inputs)?])
    }

    fn parameters(&self) -> Vec<NodeId> {
        let mut params = self.weights.clone();
        params.push(self.bias);
        params
    }
}
