#![cfg(test)]
use approx::assert_abs_diff_eq;
use gradscope::graph::{Engine, NodeId, VisualGraph};
use gradscope::presets::{self, NEURON_BIAS};
use gradscope::{MlpConfig, Module, Result};

// z = tanh(a*b + c) * exp(a) + relu(b)^2 + c/a
fn expression(graph: &mut Engine, inputs: [f64; 3]) -> Result<(Vec<NodeId>, NodeId)> {
    let leaves = graph.leaves(&inputs);
    let (a, b, c) = (leaves[0], leaves[1], leaves[2]);
    let ab = graph.mul(a, b)?;
    let s = graph.add(ab, c)?;
    let t = graph.tanh(s)?;
    let e = graph.exp(a)?;
    let left = graph.mul(t, e)?;
    let r = graph.relu(b)?;
    let sq = graph.pow(r, 2.0)?;
    let q = graph.div(c, a)?;
    let partial = graph.add(left, sq)?;
    let z = graph.add(partial, q)?;
    Ok((leaves, z))
}

fn evaluate(inputs: [f64; 3]) -> f64 {
    let mut graph = Engine::new();
    let (_, z) = expression(&mut graph, inputs).unwrap();
    graph.value(z).unwrap()
}

#[test]
fn test_gradients_match_finite_differences() {
    let point = [0.7, 1.3, -0.4];
    let mut graph = Engine::new();
    let (leaves, z) = expression(&mut graph, point).unwrap();
    graph.backward(z).unwrap();

    let h = 1e-6;
    for (i, &leaf) in leaves.iter().enumerate() {
        let mut up = point;
        let mut down = point;
        up[i] += h;
        down[i] -= h;
        let numeric = (evaluate(up) - evaluate(down)) / (2.0 * h);
        assert_abs_diff_eq!(graph.grad(leaf).unwrap(), numeric, epsilon = 1e-6);
    }
}

#[test]
fn test_arithmetic_preset() {
    let mut graph = Engine::new();
    let l = presets::simple_arithmetic(&mut graph).unwrap();
    assert_eq!(graph.value(l).unwrap(), -8.0);
    assert_eq!(graph.label(l).unwrap(), Some("L"));

    let records = graph.verbose_backward(l).unwrap();
    assert_eq!(records.len(), 6);

    let trace = graph.trace(l).unwrap();
    let grad_of = |label: &str| {
        trace
            .nodes
            .iter()
            .find(|n| n.label.as_deref() == Some(label))
            .map(|n| n.grad)
            .unwrap()
    };
    assert_eq!(grad_of("a"), 6.0);
    assert_eq!(grad_of("b"), -4.0);
    assert_eq!(grad_of("c"), -2.0);
    assert_eq!(grad_of("d"), -2.0);
    assert_eq!(grad_of("e"), -2.0);
    assert_eq!(grad_of("f"), 4.0);
}

#[test]
fn test_neuron_preset() {
    let mut graph = Engine::new();
    let o = presets::simple_neuron(&mut graph).unwrap();
    assert_abs_diff_eq!(graph.value(o).unwrap(), 0.5_f64.sqrt(), epsilon = 1e-6);

    graph.backward(o).unwrap();
    let trace = graph.trace(o).unwrap();
    let grad_of = |label: &str| {
        trace
            .nodes
            .iter()
            .find(|n| n.label.as_deref() == Some(label))
            .map(|n| n.grad)
            .unwrap()
    };
    assert_abs_diff_eq!(grad_of("n"), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_of("b"), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_of("x1"), -1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_of("w1"), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_of("x2"), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(grad_of("w2"), 0.0, epsilon = 1e-6);

    let bias = trace
        .nodes
        .iter()
        .find(|n| n.label.as_deref() == Some("b"))
        .unwrap();
    assert_eq!(bias.value, NEURON_BIAS);
}

#[test]
fn test_mlp_preset_trace() {
    let config = MlpConfig::default().with_seed(3);
    let mut graph = Engine::new();
    let y = presets::multi_layer_perceptron(&mut graph, &config).unwrap();
    let value = graph.value(y).unwrap();
    assert!(value > -1.0 && value < 1.0);

    let records = graph.verbose_backward(y).unwrap();
    let trace = graph.trace(y).unwrap();
    let edges_into_ops = trace.edges.len();
    // every recorded update follows one operand edge
    assert_eq!(records.len(), edges_into_ops);

    let visual = VisualGraph::from(&trace);
    let operators = trace.nodes.iter().filter(|n| n.op.is_some()).count();
    assert_eq!(visual.nodes.len(), trace.nodes.len() + operators);
    assert_eq!(visual.edges.len(), trace.edges.len() + operators);

    let json = visual.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        parsed["nodes"].as_array().map(Vec::len),
        Some(visual.nodes.len())
    );
}

#[test]
fn test_training_step_reduces_loss() {
    // one manual gradient step on (y - 1)^2 must lower the loss
    let config = MlpConfig::new(2, vec![4, 1]).with_seed(11);
    let mut rng = config.rng();
    let mut graph = Engine::new();
    let mlp = gradscope::Mlp::new(&mut graph, 2, &config.layer_sizes, &mut rng).unwrap();

    let loss_of = |graph: &mut Engine, mlp: &gradscope::Mlp| -> Result<NodeId> {
        let out = mlp.forward_values(graph, &[0.5, -0.5])?;
        let diff = graph.sub(out[0], 1.0)?;
        graph.pow(diff, 2.0)
    };

    let loss = loss_of(&mut graph, &mlp).unwrap();
    let before = graph.value(loss).unwrap();
    graph.backward(loss).unwrap();

    // Parameters are immutable leaves, so the step rebuilds the network.
    let lr = 0.01;
    let mut next = Engine::new();
    let stepped: Vec<f64> = mlp
        .parameters()
        .iter()
        .map(|&p| graph.value(p).unwrap() - lr * graph.grad(p).unwrap())
        .collect();
    let mut values = stepped.into_iter();
    let layers = mlp
        .layers()
        .iter()
        .map(|layer| {
            let neurons = layer
                .neurons()
                .iter()
                .map(|neuron| {
                    let weights: Vec<NodeId> = (0..neuron.fan_in())
                        .map(|_| next.leaf(values.next().unwrap()))
                        .collect();
                    let bias = next.leaf(values.next().unwrap());
                    gradscope::Neuron::from_parameters(&next, weights, bias).unwrap()
                })
                .collect();
            gradscope::Layer::from_neurons(neurons).unwrap()
        })
        .collect::<Vec<_>>();

    let mut activations = next.leaves(&[0.5, -0.5]);
    for layer in &layers {
        activations = layer.forward(&mut next, &activations).unwrap();
    }
    let diff = next.sub(activations[0], 1.0).unwrap();
    let after_loss = next.pow(diff, 2.0).unwrap();
    assert!(next.value(after_loss).unwrap() < before);
}
