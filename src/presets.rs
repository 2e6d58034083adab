//! Small ready-made graphs, handy for demos and for checking a visualization
//! layer against known numbers.

use crate::config::MlpConfig;
use crate::error::{GradError, Result};
use crate::graph::{Engine, NodeId};
use crate::nn::{Mlp, Module};

/// Bias that puts the single-neuron preset's pre-activation at `atanh(1/√2)`,
/// so its output is `1/√2` (up to rounding).
pub const NEURON_BIAS: f64 = 6.881_373_587_019_543;

/// ```text
/// e = a * b        a = 2, b = -3
/// d = e + c        c = 10
/// L = d * f        f = -2
/// ```
/// Returns `L` (= -8).
pub fn simple_arithmetic(graph: &mut Engine) -> Result<NodeId> {
    let a = graph.leaf_with_label(2.0, "a");
    let b = graph.leaf_with_label(-3.0, "b");
    let c = graph.leaf_with_label(10.0, "c");
    let f = graph.leaf_with_label(-2.0, "f");

    let e = graph.mul(a, b)?;
    graph.set_label(e, "e")?;
    let d = graph.add(e, c)?;
    graph.set_label(d, "d")?;
    let l = graph.mul(d, f)?;
    graph.set_label(l, "L")?;
    Ok(l)
}

/// `o = tanh(x1*w1 + x2*w2 + b)` with x1 = 2, x2 = 0, w1 = -3, w2 = 1 and
/// [`NEURON_BIAS`]. Returns `o`.
pub fn simple_neuron(graph: &mut Engine) -> Result<NodeId> {
    let x1 = graph.leaf_with_label(2.0, "x1");
    let x2 = graph.leaf_with_label(0.0, "x2");
    let w1 = graph.leaf_with_label(-3.0, "w1");
    let w2 = graph.leaf_with_label(1.0, "w2");
    let b = graph.leaf_with_label(NEURON_BIAS, "b");

    let x1w1 = graph.mul(x1, w1)?;
    graph.set_label(x1w1, "x1*w1")?;
    let x2w2 = graph.mul(x2, w2)?;
    graph.set_label(x2w2, "x2*w2")?;
    let sum = graph.add(x1w1, x2w2)?;
    graph.set_label(sum, "x1*w1 + x2*w2")?;
    let n = graph.add(sum, b)?;
    graph.set_label(n, "n")?;
    let o = graph.tanh(n)?;
    graph.set_label(o, "o")?;
    Ok(o)
}

/// A freshly initialized MLP described by `config`, applied to `[2, 3, ...]`
/// (one input per `config.input_size`). With the default config this is
/// MLP(2, [2, 2, 1]) on `[2, 3]`. Returns the first output node.
pub fn multi_layer_perceptron(graph: &mut Engine, config: &MlpConfig) -> Result<NodeId> {
    let mlp = Mlp::from_config(graph, config)?;
    let x: Vec<NodeId> = (0..config.input_size)
        .map(|i| graph.leaf_with_label(2.0 + i as f64, format!("x{}", i + 1)))
        .collect();
    let out = mlp.forward(graph, &x)?;
    let y = out
        .first()
        .copied()
        .ok_or_else(|| GradError::invalid_argument("network produced no output"))?;
    graph.set_label(y, "y")?;
    Ok(y)
}
