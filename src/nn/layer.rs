use rand::Rng;

use crate::error::{GradError, Result};
use crate::graph::{Engine, NodeId};
use crate::initializers::UniformInit;
use crate::nn::{Module, Neuron};

/// `fan_out` neurons reading the same inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        graph: &mut Engine,
        fan_in: usize,
        fan_out: usize,
        init: &UniformInit,
        rng: &mut R,
    ) -> Self {
        let neurons = (0..fan_out)
            .map(|_| Neuron::new(graph, fan_in, init, rng))
            .collect();
        Self { neurons }
    }

    /// Groups existing neurons. They all read the same inputs, so every
    /// neuron must have the same fan-in.
    pub fn from_neurons(neurons: Vec<Neuron>) -> Result<Self> {
        if let Some(first) = neurons.first() {
            let fan_in = first.fan_in();
            if let Some(i) = neurons.iter().position(|n| n.fan_in() != fan_in) {
                return Err(GradError::invalid_argument(format!(
                    "neuron {i} has fan-in {}, expected {fan_in}",
                    neurons[i].fan_in()
                )));
            }
        }
        Ok(Self { neurons })
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn fan_out(&self) -> usize {
        self.neurons.len()
    }
}

impl Module for Layer {
    fn forward(&self, graph: &mut Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        self.neurons
            .iter()
            .map(|neuron| neuron.output(graph, inputs))
            .collect()
    }

    fn parameters(&self) -> Vec<NodeId> {
        self.neurons.iter().flat_map(|n| n.parameters()).collect()
    }
}
