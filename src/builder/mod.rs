//! Graph builder module
//!
//! - [`GraphBuilder`]: Fluent builder for constructing graphs
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::builder::GraphBuilder;
//! use peephole_fusion::graph::make_node;
//!
//! let graph = GraphBuilder::new("main")
//!     .input("X", &[3, 2])
//!     .initializer("B", bias)
//!     .node(make_node("Add", &["X", "B"], &["t"], "add_0").with_version(7))
//!     .node(make_node("Gelu", &["t"], &["Y"], "gelu_0").with_domain("com.microsoft"))
//!     .output("Y")
//!     .build()?;
//! ```

pub mod graph;

#[cfg(test)]
pub(crate) mod fixtures;

pub use graph::GraphBuilder;
