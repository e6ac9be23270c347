//! Graph traversal queries
//!
//! Producer/consumer navigation, edge counting and topological ordering.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{GraphResult, TransformError};

use super::context::Graph;
use super::maps::{Node, NodeIndex};

impl Graph {
    // ========================================================================
    // Slot relationships
    // ========================================================================

    /// Get the producer node index for a slot
    pub fn producer_index(&self, slot: &str) -> Option<NodeIndex> {
        self.producer_map.get(slot).copied()
    }

    /// Get the producer node for a slot
    pub fn producer(&self, slot: &str) -> Option<&Node> {
        self.producer_index(slot).and_then(|idx| self.node(idx))
    }

    /// Get the distinct consumer nodes of a slot
    pub fn consumers(&self, slot: &str) -> Vec<&Node> {
        let mut seen: SmallVec<[NodeIndex; 4]> = SmallVec::new();
        if let Some(indices) = self.consumer_map.get(slot) {
            for &idx in indices {
                if !seen.contains(&idx) {
                    seen.push(idx);
                }
            }
        }
        seen.into_iter().filter_map(|idx| self.node(idx)).collect()
    }

    /// Check if a slot feeds exactly one input of one node
    pub fn is_single_use(&self, slot: &str) -> bool {
        self.consumer_map.get(slot).map_or(0, |c| c.len()) == 1 && !self.is_graph_output(slot)
    }

    // ========================================================================
    // Node neighbourhood
    // ========================================================================

    /// Distinct nodes consuming any output of `index`, in first-use order
    pub fn output_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        if let Some(node) = self.node(index) {
            for output in &node.outputs {
                if let Some(consumers) = self.consumer_map.get(output) {
                    for &consumer in consumers {
                        if !result.contains(&consumer) && self.has_node(consumer) {
                            result.push(consumer);
                        }
                    }
                }
            }
        }
        result
    }

    /// Distinct nodes producing any input of `index`, in input order
    ///
    /// Implicit inputs count, so a node owning nested graphs is ordered
    /// after the producers of the outer values those graphs read.
    pub fn input_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        if let Some(node) = self.node(index) {
            for input in node.all_inputs() {
                if let Some(producer) = self.producer_index(input) {
                    if !result.contains(&producer) && self.has_node(producer) {
                        result.push(producer);
                    }
                }
            }
        }
        result
    }

    /// Number of distinct output edges of a node
    ///
    /// An edge is one (output slot, consumer node, consumer input position)
    /// triple, so a node reading the same value twice contributes two edges.
    /// A read from inside a consumer's nested graph is one implicit edge.
    /// Graph-output registration is not an edge.
    pub fn output_edge_count(&self, index: NodeIndex) -> usize {
        let Some(node) = self.node(index) else {
            return 0;
        };

        node.outputs
            .iter()
            .map(|output| {
                self.consumers(output)
                    .iter()
                    .map(|consumer| consumer.all_inputs().filter(|i| *i == output).count())
                    .sum::<usize>()
            })
            .sum()
    }

    /// Outputs of a node that are registered as graph outputs
    pub fn graph_outputs_of_node(&self, index: NodeIndex) -> Vec<&str> {
        self.node(index)
            .map(|node| {
                node.outputs
                    .iter()
                    .filter(|o| self.is_graph_output(o))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names read by this graph's nodes that it does not define itself
    ///
    /// A name is defined locally when a node produces it or it is a graph
    /// input or initializer. Reads of nested graphs propagate upward.
    pub fn outer_scope_reads(&self) -> Vec<String> {
        let mut reads: Vec<String> = Vec::new();
        for node in self.nodes() {
            for name in node.all_inputs() {
                let local = self.producer_map.contains_key(name)
                    || self.is_graph_input(name)
                    || self.is_initializer(name);
                if !local && !reads.contains(name) {
                    reads.push(name.clone());
                }
            }
        }
        reads
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Snapshot of live node indices in topological order
    ///
    /// Kahn's algorithm with the ready set ordered by node index, so the
    /// result is deterministic. Nodes on a cycle never become ready and are
    /// left out; [`Graph::resolve`] reports them.
    pub fn nodes_in_topological_order(&self) -> Vec<NodeIndex> {
        let mut in_degree: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut ready = BinaryHeap::new();

        for node in self.nodes() {
            let degree = self.input_nodes(node.index).len();
            if degree == 0 {
                ready.push(Reverse(node.index));
            } else {
                in_degree.insert(node.index, degree);
            }
        }

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for next in self.output_nodes(index) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        in_degree.remove(&next);
                        ready.push(Reverse(next));
                    }
                }
            }
        }

        order
    }

    /// Validate the graph and all nested graphs are acyclic
    pub fn resolve(&self) -> GraphResult<()> {
        let order = self.nodes_in_topological_order();
        if order.len() != self.node_count() {
            let mut stuck: Vec<&str> = self
                .nodes()
                .filter(|n| !order.contains(&n.index))
                .map(|n| n.name.as_str())
                .collect();
            stuck.sort_unstable();
            return Err(TransformError::CycleDetected(stuck.join(", ")));
        }

        for node in self.nodes() {
            for subgraph in node.subgraphs.values() {
                subgraph.resolve()?;
            }
        }

        Ok(())
    }
}
