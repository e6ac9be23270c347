//! Error types for peephole-fusion
//!
//! This module defines all error types used throughout the crate.
//!
//! A failed pattern match is not an error: matchers return `None` and the
//! rewriter moves on. Errors are reserved for broken graph structure,
//! invalid configuration and failures surfaced by the reference executor.

use thiserror::Error;

/// Main error type for graph transformation operations
#[derive(Error, Debug)]
pub enum TransformError {
    /// Invalid node configuration
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// A node index no longer refers to a live node
    #[error("Node not found: #{0}")]
    NodeNotFound(usize),

    /// Value slot not found
    #[error("Node arg not found: {0}")]
    NodeArgNotFound(String),

    /// The graph is not a DAG
    #[error("Graph contains a cycle through nodes: {0}")]
    CycleDetected(String),

    /// Invalid optimizer configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operator has no reference kernel
    #[error("Unsupported operator: {op_type} (domain '{domain}')")]
    UnsupportedOp {
        /// Operator type
        op_type: String,
        /// Operator domain
        domain: String,
    },

    /// A value required for execution was never produced or fed
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Shapes are incompatible
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, TransformError>;

impl From<ndarray::ShapeError> for TransformError {
    fn from(err: ndarray::ShapeError) -> Self {
        TransformError::ShapeMismatch(err.to_string())
    }
}
