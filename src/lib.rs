//! # Peephole Fusion
//!
//! Bias + activation peephole fusion over a dataflow graph IR.
//!
//! This crate rewrites `Add(data, bias) -> Gelu` pairs into a single
//! `com.microsoft::BiasGelu` node, recursing into nested graphs, and ships
//! the graph container, pass framework and reference executor it runs on.
//!
//! ## Features
//!
//! - **Graph IR**: Arena of nodes with producer/consumer slot maps
//! - **Pattern Matching**: Shape-gated bias detection, backend homogeneity
//! - **Transformers**: Level-based pass driver that runs to a fixed point
//! - **Reference Executor**: Checks rewrites preserve values bit for bit
//!
//! ## Example
//!
//! ```ignore
//! use peephole_fusion::prelude::*;
//!
//! let mut graph = GraphBuilder::new("main")
//!     .input("X", &[3, 2])
//!     .initializer("B", bias)
//!     .node(make_node("Add", &["X", "B"], &["t"], "add_0").with_version(7))
//!     .node(make_node("Gelu", &["t"], &["Y"], "gelu_0").with_domain("com.microsoft"))
//!     .output("Y")
//!     .build()?;
//!
//! optimize_graph(&mut graph, &OptimizeOptions::default())?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

#[macro_use]
pub mod logging;

pub mod builder;
pub mod error;
pub mod exec;
pub mod graph;
pub mod pattern;
pub mod tensor;
pub mod traits;
pub mod transform;
pub mod transformers;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use peephole_fusion::prelude::*`
pub mod prelude {
    pub use crate::builder::GraphBuilder;
    pub use crate::error::{GraphResult, TransformError};
    pub use crate::exec::Executor;
    pub use crate::graph::{make_node, Graph, Node, NodeArg, NodeDef, NodeIndex};
    pub use crate::logging::Logger;
    pub use crate::pattern::{BiasActivationMatcher, FusionPlan};
    pub use crate::tensor::{array_from_vec, bitwise_eq, Shape};
    pub use crate::traits::GraphTransformer;
    pub use crate::transform::{OptimizeOptions, TransformStats, TransformerLevel};
    pub use crate::transformers::{optimize_graph, FuseBiasGelu, GraphTransformerManager};
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{GraphResult, TransformError};
pub use traits::GraphTransformer;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
