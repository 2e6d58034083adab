use crate::graph::node::{GraphId, NodeId};
use thiserror::Error;

/// Error type shared by the whole crate.
#[derive(Error, Debug)]
pub enum GradError {
    #[error("Node {node} belongs to graph {owner}, not to graph {graph}")]
    ForeignNode {
        node: NodeId,
        owner: GraphId,
        graph: GraphId,
    },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Shape mismatch in {context}: expected {expected} inputs, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GradError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GradError::InvalidArgument(message.into())
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        GradError::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradError>;
