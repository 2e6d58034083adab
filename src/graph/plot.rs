use std::fmt::Write;
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::Path;

use super::engine::Engine;
use super::node::NodeId;
use super::trace::{Contribution, GraphTrace, NodeSummary};
use crate::error::Result;

/// Graphviz (DOT) export of a computation graph. Layout and rendering are left
/// to Graphviz or whatever consumes the text.
pub struct GraphVisualizer {
    /// Optional styling configuration
    pub config: VisualizationConfig,
}

/// Configuration for graph visualization
#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    pub show_values: bool,
    pub show_gradients: bool,
    pub show_labels: bool,
    /// Decimal places for values and gradients.
    pub precision: usize,
    pub leaf_color: String,
    pub op_color: String,
    pub backward_color: String,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            show_values: true,
            show_gradients: true,
            show_labels: true,
            precision: 4,
            leaf_color: "#E3F2FD".to_string(),
            op_color: "#FFF3E0".to_string(),
            backward_color: "#FF4000".to_string(),
        }
    }
}

impl Default for GraphVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphVisualizer {
    pub fn new() -> Self {
        Self {
            config: VisualizationConfig::default(),
        }
    }

    pub fn with_config(config: VisualizationConfig) -> Self {
        Self { config }
    }

    /// Generate DOT format representation of the graph reachable from `root`.
    pub fn to_dot(&self, engine: &Engine, root: NodeId) -> Result<String> {
        self.to_dot_with_backward(engine, root, &[])
    }

    /// Same as [`GraphVisualizer::to_dot`], with every contribution drawn as an
    /// extra labelled edge pointing from result back to operand.
    pub fn to_dot_with_backward(
        &self,
        engine: &Engine,
        root: NodeId,
        contributions: &[Contribution],
    ) -> Result<String> {
        let trace = engine.trace(root)?;
        let mut dot = String::new();
        writeln!(dot, "digraph ComputationalGraph {{")?;
        writeln!(dot, "    rankdir=LR;")?;
        writeln!(dot, "    node [shape=record, style=filled];")?;
        writeln!(dot, "    edge [color=gray];")?;

        for node in &trace.nodes {
            let color = if node.op.is_some() {
                &self.config.op_color
            } else {
                &self.config.leaf_color
            };
            writeln!(
                dot,
                "    {} [label=\"{}\", fillcolor=\"{}\"];",
                node.id,
                self.create_node_label(node),
                color
            )?;
        }

        for edge in &trace.edges {
            writeln!(dot, "    {} -> {};", edge.from, edge.to)?;
        }

        for record in contributions {
            writeln!(
                dot,
                "    {} -> {} [color=\"{}\", style=dashed, label=\"{}\"];",
                record.source,
                record.destination,
                self.config.backward_color,
                escape(&record.description)
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Create a descriptive label for a node
    fn create_node_label(&self, node: &NodeSummary) -> String {
        let p = self.config.precision;
        let mut fields = Vec::new();

        match (&node.label, self.config.show_labels) {
            (Some(label), true) => fields.push(escape(label)),
            _ => fields.push(node.id.to_string()),
        }
        if let Some(op) = &node.op {
            fields.push(escape(op));
        }
        if self.config.show_values {
            fields.push(format!("value {:.p$}", node.value));
        }
        if self.config.show_gradients {
            fields.push(format!("grad {:.p$}", node.grad));
        }

        fields.join(" | ")
    }

    /// Save the graph as a DOT file
    pub fn save_dot(&self, engine: &Engine, root: NodeId, path: impl AsRef<Path>) -> Result<()> {
        let dot_content = self.to_dot(engine, root)?;
        let mut file = File::create(path)?;
        file.write_all(dot_content.as_bytes())?;
        Ok(())
    }

    /// Simple text representation, one node per line in topological order.
    pub fn render_text(&self, trace: &GraphTrace) -> String {
        let p = self.config.precision;
        let mut out = String::new();
        out.push_str("Computational Graph:\n");
        out.push_str("===================\n");

        for node in &trace.nodes {
            let mut line = format!("Node {}: ", node.id);
            match &node.op {
                Some(op) => line.push_str(&format!("{op} ")),
                None => line.push_str("leaf "),
            }
            if let (Some(label), true) = (&node.label, self.config.show_labels) {
                line.push_str(&format!("[{label}] "));
            }
            if self.config.show_values {
                line.push_str(&format!("value={:.p$} ", node.value));
            }
            if self.config.show_gradients {
                line.push_str(&format!("grad={:.p$} ", node.grad));
            }
            let inputs: Vec<String> = trace
                .edges
                .iter()
                .filter(|e| e.to == node.id)
                .map(|e| e.from.to_string())
                .collect();
            if !inputs.is_empty() {
                line.push_str(&format!("<- [{}]", inputs.join(", ")));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// Print the graph to console (simple text representation)
    pub fn print_graph(&self, engine: &Engine, root: NodeId) -> Result<()> {
        let trace = engine.trace(root)?;
        print!("{}", self.render_text(&trace));
        Ok(())
    }
}

// DOT record labels treat these as structure characters.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '{' | '}' | '<' | '>' | '|' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// Extension trait to add visualization methods directly to Engine
pub trait EngineVisualization {
    fn visualize(&self) -> GraphVisualizer;
    fn plot_graph(&self, root: NodeId) -> Result<()>;
    fn save_graph_dot(&self, root: NodeId, path: impl AsRef<Path>) -> Result<()>;
}

impl EngineVisualization for Engine {
    fn visualize(&self) -> GraphVisualizer {
        GraphVisualizer::new()
    }

    fn plot_graph(&self, root: NodeId) -> Result<()> {
        self.visualize().print_graph(self, root)
    }

    fn save_graph_dot(&self, root: NodeId, path: impl AsRef<Path>) -> Result<()> {
        self.visualize().save_dot(self, root, path)
    }
}
