//! Graph container
//!
//! `Graph` is the central structure for working with the dataflow IR.
//! Nodes live in an append-only arena of `Option<Node>` slots; value slots
//! and their producer/consumer relations are kept in name-keyed maps.

use ndarray::ArrayD;

use super::maps::{
    ConsumerMap, InitializerMap, Node, NodeArg, NodeArgMap, NodeIndex, NodeNameMap, ProducerMap,
};

/// Mutable dataflow graph
///
/// Invariants:
/// - every slot has at most one producer (`producer_map`)
/// - `consumer_map` holds one entry per input use of a live node
/// - `node_names` maps every named live node to its index
/// - a removed node leaves a `None` slot behind; its index is never reused
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub(crate) name: String,
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) node_names: NodeNameMap,
    pub(crate) node_args: NodeArgMap,
    pub(crate) producer_map: ProducerMap,
    pub(crate) consumer_map: ConsumerMap,
    pub(crate) initializers: InitializerMap,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
    pub(crate) name_counter: usize,
}

impl Graph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by index; `None` if it was removed
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0).and_then(Option::as_ref)
    }

    /// Get a mutable node by index; `None` if it was removed
    ///
    /// Only the descriptive fields are public. The name, slot wiring and
    /// nested graphs are read through getters, so edits through this handle
    /// leave the name and producer/consumer maps in sync.
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index.0).and_then(Option::as_mut)
    }

    /// Find a live node by name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_names.get(name).and_then(|&idx| self.node(idx))
    }

    /// Check if a node is still live
    pub fn has_node(&self, index: NodeIndex) -> bool {
        self.node(index).is_some()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Arena length, including removed slots
    pub fn max_node_index(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over live nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    /// Find live nodes by op type
    pub fn find_nodes_by_op<'a>(&'a self, op_type: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes().filter(move |n| n.op_type == op_type)
    }

    // ========================================================================
    // Slot accessors
    // ========================================================================

    /// Get a value slot by name
    pub fn node_arg(&self, name: &str) -> Option<&NodeArg> {
        self.node_args.get(name)
    }

    /// Iterate over value slots
    pub fn node_args(&self) -> impl Iterator<Item = &NodeArg> {
        self.node_args.values()
    }

    /// Graph input slot names, in order
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Graph output slot names, in order
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Check if a slot is a graph input
    pub fn is_graph_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|n| n == name)
    }

    /// Check if a slot is a graph output
    pub fn is_graph_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|n| n == name)
    }

    /// Check if a slot is backed by an initializer
    pub fn is_initializer(&self, name: &str) -> bool {
        self.initializers.contains_key(name)
    }

    /// Get initializer data by slot name
    pub fn initializer(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.initializers.get(name)
    }

    /// Iterate over initializers
    pub fn initializers(&self) -> impl Iterator<Item = (&String, &ArrayD<f32>)> {
        self.initializers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::maps::make_node;
    use crate::tensor::Shape;

    fn make_test_graph() -> Graph {
        let mut graph = Graph::new("main");
        graph.add_input(NodeArg::new("X").with_shape(Shape::from_fixed(&[3, 2])));
        graph
            .add_node(make_node("Relu", &["X"], &["relu_out"], "relu_0"))
            .unwrap();
        graph
            .add_node(make_node("Identity", &["relu_out"], &["Y"], "identity_0"))
            .unwrap();
        graph.add_output("Y");
        graph
    }

    #[test]
    fn test_graph_creation() {
        let graph = make_test_graph();

        assert_eq!(graph.name(), "main");
        assert_eq!(graph.node_count(), 2);
        assert!(graph.has_node(NodeIndex(0)));
        assert!(graph.has_node(NodeIndex(1)));
        assert!(!graph.has_node(NodeIndex(2)));
    }

    #[test]
    fn test_node_lookup() {
        let graph = make_test_graph();

        let relu = graph.node_by_name("relu_0").unwrap();
        assert_eq!(relu.op_type, "Relu");
        assert_eq!(relu.index(), NodeIndex(0));
        assert!(graph.node_by_name("nonexistent").is_none());
        assert_eq!(graph.find_nodes_by_op("Identity").count(), 1);
    }

    #[test]
    fn test_is_graph_input_output() {
        let graph = make_test_graph();

        assert!(graph.is_graph_input("X"));
        assert!(!graph.is_graph_input("relu_out"));
        assert!(graph.is_graph_output("Y"));
        assert!(!graph.is_graph_output("relu_out"));
    }

    #[test]
    fn test_node_args_registered() {
        let graph = make_test_graph();

        assert_eq!(graph.node_arg("X").and_then(NodeArg::rank), Some(2));
        assert!(graph.node_arg("relu_out").is_some());
        assert!(graph.node_arg("relu_out").unwrap().shape.is_none());
        assert_eq!(graph.node_args().count(), 3);
    }

    #[test]
    fn test_removed_node_reads_as_absent() {
        let mut graph = make_test_graph();

        graph.remove_node(NodeIndex(0)).unwrap();
        assert!(graph.node(NodeIndex(0)).is_none());
        assert!(graph.node_mut(NodeIndex(0)).is_none());
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.max_node_index(), 2);
    }

    #[test]
    fn test_node_mut_edits_keep_lookup_in_sync() {
        let mut graph = make_test_graph();

        let node = graph.node_mut(NodeIndex(0)).unwrap();
        node.description = "edited".to_string();
        node.backend = "cuda".to_string();

        let name = graph.node(NodeIndex(0)).unwrap().name().to_string();
        let found = graph.node_by_name(&name).unwrap();
        assert_eq!(found.index(), NodeIndex(0));
        assert_eq!(found.description, "edited");
        assert_eq!(graph.producer_index("relu_out"), Some(NodeIndex(0)));
    }
}
