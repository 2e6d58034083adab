use log::debug;
use rand::Rng;

use crate::config::MlpConfig;
use crate::error::{GradError, Result};
use crate::graph::{Engine, NodeId};
use crate::initializers::UniformInit;
use crate::nn::{Layer, Module};

/// Multi-layer perceptron: layers applied in sequence, each layer's outputs
/// feeding the next.
#[derive(Debug, Clone)]
pub struct Mlp {
    input_size: usize,
    layers: Vec<Layer>,
}

impl Mlp {
    /// Allocates every parameter in `graph`, uniformly in `(-1, 1)`.
    ///
    /// Fails if `layer_sizes` is empty or any size (including `input_size`) is 0.
    pub fn new<R: Rng + ?Sized>(
        graph: &mut Engine,
        input_size: usize,
        layer_sizes: &[usize],
        rng: &mut R,
    ) -> Result<Self> {
        MlpConfig::new(input_size, layer_sizes.to_vec()).validate()?;
        let init = UniformInit::symmetric_unit()?;

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut fan_in = input_size;
        for &fan_out in layer_sizes {
            layers.push(Layer::new(graph, fan_in, fan_out, &init, rng));
            fan_in = fan_out;
        }

        let mlp = Self { input_size, layers };
        debug!(
            "mlp {input_size} -> {layer_sizes:?}: {} parameters",
            mlp.num_parameters()
        );
        Ok(mlp)
    }

    /// Builds the network described by `config`, seeding from `config.seed`.
    pub fn from_config(graph: &mut Engine, config: &MlpConfig) -> Result<Self> {
        let mut rng = config.rng();
        Self::new(graph, config.input_size, &config.layer_sizes, &mut rng)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Promotes `values` to input leaves and runs the network.
    pub fn forward_values(&self, graph: &mut Engine, values: &[f64]) -> Result<Vec<NodeId>> {
        // Check the width first so a bad call allocates nothing.
        if values.len() != self.input_size {
            return Err(GradError::ShapeMismatch {
                expected: self.input_size,
                actual: values.len(),
                context: "Mlp::forward_values".to_string(),
            });
        }
        let inputs = graph.leaves(values);
        self.forward(graph, &inputs)
    }
}

impl Module for Mlp {
    fn forward(&self, graph: &mut Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        let mut activations = inputs.to_vec();
        for layer in &self.layers {
            activations = layer.forward(graph, &activations)?;
        }
        Ok(activations)
    }

    fn parameters(&self) -> Vec<NodeId> {
        self.layers.iter().flat_map(|l| l.parameters()).collect()
    }
}
