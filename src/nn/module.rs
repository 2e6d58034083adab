use crate::error::Result;
use crate::graph::{Engine, NodeId};

/// The base trait for the network building blocks.
///
/// A module owns leaf nodes (its parameters) inside an [`Engine`] and maps a
/// slice of input nodes to output nodes by applying engine operations. Every
/// forward call allocates new intermediate nodes that reference the
/// parameters; the parameters themselves are never modified.
///
/// # Examples
///
/// ```rust
/// use gradscope::graph::Engine;
/// use gradscope::nn::{Mlp, Module};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut graph = Engine::new();
/// let mut rng = StdRng::seed_from_u64(0);
/// let mlp = Mlp::new(&mut graph, 2, &[2, 2, 1], &mut rng).unwrap();
///
/// let x = graph.leaves(&[2.0, 3.0]);
/// let out = mlp.forward(&mut graph, &x).unwrap();
/// assert_eq!(out.len(), 1);
/// assert_eq!(mlp.num_parameters(), 15);
/// ```
pub trait Module {
    /// Performs the forward pass of the module.
    ///
    /// # Arguments
    ///
    /// * `graph` - The engine owning both the parameters and the inputs
    /// * `inputs` - Input node handles
    ///
    /// # Returns
    ///
    /// The output node handles, in order
    fn forward(&self, graph: &mut Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>>;

    /// Every owned weight and bias, flattened in a stable order.
    fn parameters(&self) -> Vec<NodeId>;

    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }
}
