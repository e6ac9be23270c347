//! Core traits for peephole-fusion
//!
//! Defines the protocol every graph rewrite pass follows.

use log::Level;
use rustc_hash::FxHashSet;

use crate::error::GraphResult;
use crate::graph::{Graph, NodeIndex};
use crate::logging::Logger;

/// A rewrite pass over a [`Graph`]
///
/// Implementations provide [`apply_impl`](GraphTransformer::apply_impl): one
/// traversal of one graph level that returns whether anything changed.
/// While traversing, an implementation calls
/// [`recurse`](GraphTransformer::recurse) on each visited node before
/// rewriting it, so nested graphs are handled first and independently.
///
/// # Example
///
/// ```ignore
/// struct Noop(FxHashSet<String>);
///
/// impl GraphTransformer for Noop {
///     fn name(&self) -> &str { "Noop" }
///     fn compatible_backends(&self) -> &FxHashSet<String> { &self.0 }
///     fn apply_impl(&self, graph: &mut Graph, level: usize, logger: &Logger) -> GraphResult<bool> {
///         let mut modified = false;
///         for index in graph.nodes_in_topological_order() {
///             modified |= self.recurse(graph, index, level, logger)?;
///         }
///         Ok(modified)
///     }
/// }
/// ```
pub trait GraphTransformer {
    /// Name of the transformer
    fn name(&self) -> &str;

    /// Backends this transformer may rewrite nodes on; empty means all
    fn compatible_backends(&self) -> &FxHashSet<String>;

    /// One traversal of `graph`, which sits `graph_level` levels below the
    /// top-level graph
    fn apply_impl(&self, graph: &mut Graph, graph_level: usize, logger: &Logger)
        -> GraphResult<bool>;

    /// Apply this transformer to every graph nested in the node at `index`
    ///
    /// Errors from a nested graph are returned unchanged. A removed node
    /// has nothing to recurse into. After a change the node's implicit
    /// inputs are recomputed from the rewritten graphs.
    fn recurse(
        &self,
        graph: &mut Graph,
        index: NodeIndex,
        graph_level: usize,
        logger: &Logger,
    ) -> GraphResult<bool> {
        let Some(node) = graph.node_mut(index) else {
            return Ok(false);
        };

        let mut modified = false;
        for subgraph in node.subgraphs.values_mut() {
            modified |= self.apply_impl(subgraph, graph_level + 1, logger)?;
        }
        if modified {
            graph.refresh_implicit_inputs(index);
        }
        Ok(modified)
    }

    /// Run the transformer on `graph`
    ///
    /// Entry point for the pipeline driver. A top-level graph is validated,
    /// nested graphs included, before anything is rewritten, so a cyclic
    /// input fails with the graph untouched.
    fn apply(&self, graph: &mut Graph, graph_level: usize, logger: &Logger) -> GraphResult<bool> {
        if graph_level == 0 {
            graph.resolve()?;
        }

        let modified = self.apply_impl(graph, graph_level, logger)?;
        pass_log!(
            logger,
            Level::Debug,
            "{} on graph '{}' (level {}): modified={}",
            self.name(),
            graph.name(),
            graph_level,
            modified
        );

        Ok(modified)
    }
}
