//! Graph container for the dataflow IR
//!
//! This module provides the graph the fusion passes operate on:
//!
//! - [`Graph`]: arena of nodes with stable [`NodeIndex`] handles
//! - [`maps`]: node records, slot records and map type aliases
//! - [`utils`]: node predicates shared by transformers
//!
//! # Overview
//!
//! Nodes are stored in an append-only arena of `Option<Node>` slots. Removing
//! a node empties its slot, so an index held across a removal reads back as
//! `None` instead of aliasing another node. Value slots are named; each has
//! at most one producer and any number of consumers.
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::graph::{make_node, Graph};
//!
//! let mut graph = Graph::new("main");
//! let add = graph.add_node(make_node("Add", &["X", "B"], &["t"], "add_0"))?;
//! let order = graph.nodes_in_topological_order();
//!
//! if graph.output_edge_count(add) == 1 {
//!     // single consumer...
//! }
//! ```
//!
//! # Maps
//!
//! | Map | Description |
//! |-----|-------------|
//! | `producer_map` | slot name → producer node |
//! | `consumer_map` | slot name → consumer nodes |
//! | `node_names` | node name → node index |
//! | `node_args` | slot name → NodeArg (order preserved) |
//! | `initializers` | slot name → constant data |

pub mod accessors;
pub mod context;
pub mod maps;
pub mod mutators;
pub mod utils;

// Re-export main types
pub use context::Graph;
pub use maps::{
    make_node, ConsumerMap, InitializerMap, Node, NodeArg, NodeArgMap, NodeDef, NodeIndex,
    NodeNameMap, ProducerMap, SubgraphMap,
};
pub use utils::{is_supported_backend, is_supported_optype_version_and_domain};
