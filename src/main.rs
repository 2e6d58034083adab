use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;

use gradscope::config::{MlpConfig, TraceConfig};
use gradscope::graph::{Contribution, Engine, GraphTrace, GraphVisualizer, NodeId, VisualGraph};
use gradscope::presets;

#[derive(Parser)]
#[command(name = "gradscope")]
#[command(about = "Build a small computation graph, backpropagate and dump the trace", long_about = None)]
#[command(version)]
struct Cli {
    /// Graph to build
    #[arg(value_enum, default_value_t = Preset::Arithmetic)]
    preset: Preset,

    /// Backward pass to run before dumping
    #[arg(short, long, value_enum, default_value_t = Backward::Verbose)]
    backward: Backward,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Seed for the MLP preset (overrides GRADSCOPE_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Decimals in contribution descriptions (overrides GRADSCOPE_PRECISION)
    #[arg(long)]
    precision: Option<usize>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// L = (a*b + c) * f
    Arithmetic,
    /// o = tanh(x1*w1 + x2*w2 + b)
    Neuron,
    /// MLP(2, [2, 2, 1]) on [2, 3]; shape from GRADSCOPE_INPUT_SIZE / GRADSCOPE_LAYERS
    Mlp,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backward {
    Skip,
    Plain,
    Verbose,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One line per node, then the contributions
    Text,
    /// Graphviz DOT, contributions as dashed edges
    Dot,
    /// Node/edge trace and contributions as JSON
    Json,
    /// Value + operator vertices as JSON, ready for a layered layout
    Visual,
}

#[derive(Serialize)]
struct Dump<'a> {
    trace: GraphTrace,
    contributions: &'a [Contribution],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut trace_config = TraceConfig::from_env()?;
    if let Some(precision) = cli.precision {
        trace_config.precision = precision;
    }
    let mut engine = Engine::with_config(trace_config);
    let root = build(&mut engine, cli.preset, cli.seed)?;

    let contributions = match cli.backward {
        Backward::Skip => Vec::new(),
        Backward::Plain => {
            engine.backward(root)?;
            Vec::new()
        }
        Backward::Verbose => engine.verbose_backward(root)?,
    };
    info!(
        "graph has {} nodes, {} contributions recorded",
        engine.len(),
        contributions.len()
    );

    let rendered = render(&engine, root, &contributions, cli.format)?;
    match cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn build(engine: &mut Engine, preset: Preset, seed: Option<u64>) -> gradscope::Result<NodeId> {
    match preset {
        Preset::Arithmetic => presets::simple_arithmetic(engine),
        Preset::Neuron => presets::simple_neuron(engine),
        Preset::Mlp => {
            let mut config = MlpConfig::from_env()?;
            if seed.is_some() {
                config.seed = seed;
            }
            presets::multi_layer_perceptron(engine, &config)
        }
    }
}

fn render(
    engine: &Engine,
    root: NodeId,
    contributions: &[Contribution],
    format: Format,
) -> gradscope::Result<String> {
    let visualizer = GraphVisualizer::new();
    match format {
        Format::Text => {
            let mut out = visualizer.render_text(&engine.trace(root)?);
            if !contributions.is_empty() {
                out.push_str("\nBackward:\n");
                for (step, c) in contributions.iter().enumerate() {
                    out.push_str(&format!(
                        "{step:>3}. {} -> {}: {}\n",
                        c.source, c.destination, c.description
                    ));
                }
            }
            Ok(out)
        }
        Format::Dot => visualizer.to_dot_with_backward(engine, root, contributions),
        Format::Json => {
            let dump = Dump {
                trace: engine.trace(root)?,
                contributions,
            };
            Ok(format!("{}\n", serde_json::to_string_pretty(&dump)?))
        }
        Format::Visual => {
            let visual = VisualGraph::from(&engine.trace(root)?);
            Ok(format!("{}\n", visual.to_json()?))
        }
    }
}
