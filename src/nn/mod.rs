// Neural Network Module
// Neuron, Layer and Mlp built from engine operations. Parameters are plain
// leaf nodes owned by the engine; the modules only keep their handles.

pub mod layer;
pub mod mlp;
pub mod module;
pub mod neuron;

pub use layer::Layer;
pub use mlp::Mlp;
pub use module::Module;
pub use neuron::Neuron;
