pub mod engine;
pub mod node;
pub mod op;
pub mod plot;
mod topo;
pub mod trace;

pub use engine::Engine;
pub use node::{GraphId, Node, NodeId};
pub use op::{Op, Operand, Upstream};
pub use plot::{EngineVisualization, GraphVisualizer, VisualizationConfig};
pub use trace::{
    Contribution, Edge, GraphTrace, NodeSummary, VisualEdge, VisualGraph, VisualNode,
    contributions_to_json,
};
