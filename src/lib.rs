//! # Gradscope
//!
//! Gradscope is a small scalar automatic differentiation engine written in Rust,
//! in the spirit of micrograd, built to be looked at: every backward pass can
//! report each gradient update it performs.
//!
//! ## Features
//!
//! - Reverse-mode automatic differentiation over scalar nodes
//! - Arena-backed computation graph addressed by copyable handles
//! - Add, multiply, power, ReLU, exp and tanh, with raw numbers promoted to leaves
//! - Gradient accumulation for nodes reused in several expressions
//! - Verbose backward pass emitting one contribution record per operand update
//! - Node/edge traces exported as JSON or Graphviz DOT
//! - Neuron / Layer / MLP modules with seedable initialization
//!
//! ```rust
//! use gradscope::graph::Engine;
//!
//! let mut g = Engine::new();
//! let x = g.leaf(3.0);
//! let y = g.mul(x, x).unwrap();
//! g.backward(y).unwrap();
//! assert_eq!(g.grad(x).unwrap(), 6.0);
//! ```
pub mod config;
pub mod error;
pub mod graph;
pub mod initializers;
pub mod nn;
pub mod presets;

// Re-export commonly used types for convenience
pub use config::{MlpConfig, TraceConfig};
pub use error::{GradError, Result};
pub use graph::{Contribution, Engine, GraphTrace, NodeId, Op, Operand, VisualGraph};
pub use nn::{Layer, Mlp, Module, Neuron};
