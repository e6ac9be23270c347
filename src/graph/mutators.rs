//! Graph mutation operations
//!
//! Methods for modifying the graph structure: adding and removing nodes,
//! finalizing fusions, and registering graph-level slots.

use ndarray::ArrayD;

use crate::error::{GraphResult, TransformError};
use crate::tensor::Shape;

use super::context::Graph;
use super::maps::{outer_scope_reads, Node, NodeArg, NodeDef, NodeIndex};

impl Graph {
    // ========================================================================
    // Node mutation
    // ========================================================================

    /// Insert a new node into the graph
    ///
    /// Registers the node as producer of its outputs and consumer of its
    /// inputs, including the outer-scope values its nested graphs read.
    /// Empty slot names mark omitted optional inputs and are skipped.
    pub fn add_node(&mut self, def: NodeDef) -> GraphResult<NodeIndex> {
        if !def.name.is_empty() && self.node_names.contains_key(&def.name) {
            return Err(TransformError::InvalidNode(format!(
                "duplicate node name '{}'",
                def.name
            )));
        }
        for output in def.outputs.iter().filter(|o| !o.is_empty()) {
            if let Some(existing) = self.producer_index(output) {
                return Err(TransformError::InvalidNode(format!(
                    "slot '{}' of '{}' is already produced by node {}",
                    output, def.name, existing
                )));
            }
        }

        let index = NodeIndex(self.nodes.len());
        let node = Node::from_def(index, def);

        for input in node.all_inputs() {
            self.ensure_node_arg(input);
            self.consumer_map
                .entry(input.clone())
                .or_default()
                .push(index);
        }
        for output in node.outputs.iter().filter(|o| !o.is_empty()) {
            self.ensure_node_arg(output);
            self.producer_map.insert(output.clone(), index);
        }
        if !node.name.is_empty() {
            self.node_names.insert(node.name.clone(), index);
        }

        self.nodes.push(Some(node));
        Ok(index)
    }

    /// Remove a node from the graph
    ///
    /// Detaches its producer and consumer records and drops slots left
    /// dangling. Returns `None` if the node was already removed.
    pub fn remove_node(&mut self, index: NodeIndex) -> Option<Node> {
        let node = self.nodes.get_mut(index.0)?.take()?;

        for input in node.all_inputs() {
            if let Some(consumers) = self.consumer_map.get_mut(input) {
                consumers.retain(|c| *c != index);
                if consumers.is_empty() {
                    self.consumer_map.remove(input);
                }
            }
        }
        for output in &node.outputs {
            if self.producer_index(output) == Some(index) {
                self.producer_map.remove(output);
            }
        }
        if self.node_names.get(&node.name) == Some(&index) {
            self.node_names.remove(&node.name);
        }

        for slot in node.all_inputs().chain(node.outputs.iter()) {
            self.prune_node_arg(slot);
        }

        Some(node)
    }

    /// Replace `nodes` by `replacement`
    ///
    /// The output slots of the last node in `nodes` move to `replacement`,
    /// so their consumers and graph-output registration now refer to it
    /// unchanged. All of `nodes` are then removed. Every index is checked
    /// before anything is mutated.
    pub fn finalize_node_fusion(
        &mut self,
        nodes: &[NodeIndex],
        replacement: NodeIndex,
    ) -> GraphResult<()> {
        let &last = nodes
            .last()
            .ok_or_else(|| TransformError::InvalidNode("empty fusion group".to_string()))?;
        if nodes.contains(&replacement) {
            return Err(TransformError::InvalidNode(format!(
                "replacement node {} is part of its own fusion group",
                replacement
            )));
        }
        for &idx in nodes.iter().chain(std::iter::once(&replacement)) {
            if !self.has_node(idx) {
                return Err(TransformError::NodeNotFound(idx.0));
            }
        }

        let moved = self
            .node_mut(last)
            .map(|n| std::mem::take(&mut n.outputs))
            .unwrap_or_default();
        for output in moved.iter().filter(|o| !o.is_empty()) {
            self.producer_map.insert(output.clone(), replacement);
        }
        if let Some(node) = self.node_mut(replacement) {
            node.outputs.extend(moved);
        }

        for &idx in nodes {
            self.remove_node(idx);
        }

        Ok(())
    }

    /// Generate a node name not used by any live node
    pub fn generate_node_name(&mut self, base: &str) -> String {
        loop {
            let candidate = format!("{}_token_{}", base, self.name_counter);
            self.name_counter += 1;
            if !self.node_names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Attach a nested graph to an existing node
    pub fn add_subgraph(
        &mut self,
        index: NodeIndex,
        attribute: impl Into<String>,
        subgraph: Graph,
    ) -> GraphResult<()> {
        let node = self
            .node_mut(index)
            .ok_or(TransformError::NodeNotFound(index.0))?;
        node.subgraphs.insert(attribute.into(), subgraph);
        self.refresh_implicit_inputs(index);
        Ok(())
    }

    /// Recompute the outer-scope reads of a node's nested graphs
    ///
    /// Must follow any change to those graphs so the node stays registered
    /// as consumer of exactly the values they read.
    pub(crate) fn refresh_implicit_inputs(&mut self, index: NodeIndex) {
        let Some(node) = self.node_mut(index) else {
            return;
        };
        let fresh = outer_scope_reads(&node.subgraphs);
        if fresh == node.implicit_inputs {
            return;
        }
        let stale = std::mem::replace(&mut node.implicit_inputs, fresh.clone());

        for name in &stale {
            if let Some(consumers) = self.consumer_map.get_mut(name) {
                if let Some(pos) = consumers.iter().position(|c| *c == index) {
                    consumers.remove(pos);
                }
                if consumers.is_empty() {
                    self.consumer_map.remove(name);
                }
            }
        }
        for name in &fresh {
            self.ensure_node_arg(name);
            self.consumer_map.entry(name.clone()).or_default().push(index);
        }
        for name in &stale {
            self.prune_node_arg(name);
        }
    }

    // ========================================================================
    // Slot mutation
    // ========================================================================

    /// Register a graph input
    pub fn add_input(&mut self, arg: NodeArg) {
        if !self.is_graph_input(&arg.name) {
            self.inputs.push(arg.name.clone());
        }
        self.upsert_node_arg(arg);
    }

    /// Register a graph output
    pub fn add_output(&mut self, name: &str) {
        self.ensure_node_arg(name);
        if !self.is_graph_output(name) {
            self.outputs.push(name.to_string());
        }
    }

    /// Replace the graph inputs
    pub fn set_inputs(&mut self, inputs: Vec<NodeArg>) {
        let previous = std::mem::take(&mut self.inputs);
        for arg in inputs {
            self.add_input(arg);
        }
        for name in &previous {
            self.prune_node_arg(name);
        }
    }

    /// Replace the graph outputs
    pub fn set_outputs(&mut self, outputs: &[&str]) {
        let previous = std::mem::take(&mut self.outputs);
        for name in outputs {
            self.add_output(name);
        }
        for name in &previous {
            self.prune_node_arg(name);
        }
    }

    /// Add or update an initializer; the slot's shape follows the data
    pub fn set_initializer(&mut self, name: &str, data: ArrayD<f32>) {
        let shape = Shape::from_extents(data.shape());
        self.upsert_node_arg(NodeArg::new(name).with_shape(shape));
        self.initializers.insert(name.to_string(), data);
    }

    /// Record the static shape of a slot
    pub fn set_shape(&mut self, name: &str, shape: Option<Shape>) {
        self.ensure_node_arg(name);
        if let Some(arg) = self.node_args.get_mut(name) {
            arg.shape = shape;
        }
    }

    // ========================================================================
    // Slot bookkeeping helpers
    // ========================================================================

    fn ensure_node_arg(&mut self, name: &str) {
        if !self.node_args.contains_key(name) {
            self.node_args
                .insert(name.to_string(), NodeArg::new(name));
        }
    }

    fn upsert_node_arg(&mut self, arg: NodeArg) {
        match self.node_args.get_mut(&arg.name) {
            Some(existing) => {
                if arg.shape.is_some() {
                    existing.shape = arg.shape;
                }
            }
            None => {
                self.node_args.insert(arg.name.clone(), arg);
            }
        }
    }

    fn prune_node_arg(&mut self, name: &str) {
        let dangling = !self.producer_map.contains_key(name)
            && !self.consumer_map.contains_key(name)
            && !self.is_graph_input(name)
            && !self.is_graph_output(name)
            && !self.is_initializer(name);
        if dangling {
            self.node_args.shift_remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::maps::make_node;

    fn make_test_graph() -> Graph {
        let mut graph = Graph::new("main");
        graph.add_input(NodeArg::new("X"));
        graph
            .add_node(make_node("Relu", &["X"], &["relu_out"], "relu_0"))
            .unwrap();
        graph
            .add_node(make_node("Sigmoid", &["relu_out"], &["Y"], "sigmoid_0"))
            .unwrap();
        graph.add_output("Y");
        graph
    }

    #[test]
    fn test_add_node_registers_slots() {
        let mut graph = make_test_graph();

        let idx = graph
            .add_node(make_node("Tanh", &["Y"], &["Z"], "tanh_0"))
            .unwrap();

        assert_eq!(graph.producer_index("Z"), Some(idx));
        assert_eq!(graph.consumers("Y")[0].name, "tanh_0");
        assert_eq!(graph.node_by_name("tanh_0").unwrap().index(), idx);
    }

    #[test]
    fn test_add_node_rejects_second_producer() {
        let mut graph = make_test_graph();

        let err = graph
            .add_node(make_node("Tanh", &["X"], &["relu_out"], "tanh_0"))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidNode(_)));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_add_node_rejects_duplicate_name() {
        let mut graph = make_test_graph();

        let err = graph
            .add_node(make_node("Tanh", &["X"], &["T"], "relu_0"))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidNode(_)));
    }

    #[test]
    fn test_remove_node_detaches_slots() {
        let mut graph = make_test_graph();

        let removed = graph.remove_node(NodeIndex(1)).unwrap();
        assert_eq!(removed.op_type, "Sigmoid");
        assert!(graph.node_by_name("sigmoid_0").is_none());
        assert!(graph.producer_index("Y").is_none());
        assert!(graph.consumers("relu_out").is_empty());
        // graph output slot survives, intermediate one is still produced
        assert!(graph.node_arg("Y").is_some());
        assert!(graph.node_arg("relu_out").is_some());

        assert!(graph.remove_node(NodeIndex(1)).is_none());
    }

    #[test]
    fn test_remove_node_prunes_dangling_slots() {
        let mut graph = make_test_graph();

        graph.remove_node(NodeIndex(1));
        graph.remove_node(NodeIndex(0));

        assert!(graph.node_arg("relu_out").is_none());
        assert!(graph.node_arg("X").is_some());
        assert!(graph.node_arg("Y").is_some());
    }

    #[test]
    fn test_finalize_node_fusion_moves_outputs() {
        let mut graph = make_test_graph();
        let fused = graph
            .add_node(NodeDef::new("HardSwish", "fused_0").with_inputs(["X"]))
            .unwrap();

        graph
            .finalize_node_fusion(&[NodeIndex(0), NodeIndex(1)], fused)
            .unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(fused).unwrap().outputs(), &["Y".to_string()]);
        assert_eq!(graph.producer_index("Y"), Some(fused));
        assert!(graph.is_graph_output("Y"));
        assert!(graph.node_arg("relu_out").is_none());
    }

    #[test]
    fn test_finalize_node_fusion_is_all_or_nothing() {
        let mut graph = make_test_graph();
        let fused = graph
            .add_node(NodeDef::new("HardSwish", "fused_0").with_inputs(["X"]))
            .unwrap();
        let before = graph.clone();

        let err = graph
            .finalize_node_fusion(&[NodeIndex(0), NodeIndex(7)], fused)
            .unwrap_err();
        assert!(matches!(err, TransformError::NodeNotFound(7)));
        assert_eq!(graph, before);

        assert!(graph.finalize_node_fusion(&[], fused).is_err());
        assert!(graph.finalize_node_fusion(&[fused], fused).is_err());
    }

    #[test]
    fn test_generate_node_name() {
        let mut graph = make_test_graph();

        let first = graph.generate_node_name("BiasGelu");
        let second = graph.generate_node_name("BiasGelu");
        assert_ne!(first, second);
        assert!(first.starts_with("BiasGelu"));
    }

    #[test]
    fn test_set_initializer_records_shape() {
        let mut graph = make_test_graph();

        graph.set_initializer("B", ndarray::ArrayD::zeros(ndarray::IxDyn(&[2])));
        assert!(graph.is_initializer("B"));
        assert_eq!(graph.node_arg("B").and_then(NodeArg::rank), Some(1));
    }

    #[test]
    fn test_add_subgraph() {
        let mut graph = make_test_graph();

        graph
            .add_subgraph(NodeIndex(0), "body", Graph::new("body"))
            .unwrap();
        assert!(graph.node(NodeIndex(0)).unwrap().has_subgraphs());
        assert!(graph.add_subgraph(NodeIndex(9), "body", Graph::new("x")).is_err());
    }

    #[test]
    fn test_set_outputs_replaces_list() {
        let mut graph = make_test_graph();

        graph.set_outputs(&["relu_out"]);
        assert_eq!(graph.outputs(), &["relu_out".to_string()]);
        assert!(!graph.is_graph_output("Y"));
        // still produced by sigmoid_0
        assert!(graph.node_arg("Y").is_some());

        graph.set_inputs(vec![NodeArg::new("X2")]);
        assert_eq!(graph.inputs(), &["X2".to_string()]);
        // consumed by relu_0
        assert!(graph.node_arg("X").is_some());
    }

    fn reads_relu_out() -> Graph {
        let mut body = Graph::new("body");
        body.add_node(make_node("Neg", &["relu_out"], &["n"], "inner_neg"))
            .unwrap();
        body.add_output("n");
        body
    }

    #[test]
    fn test_nested_reads_register_implicit_consumer() {
        let mut graph = make_test_graph();

        let loop_index = graph
            .add_node(
                make_node("Loop", &["X"], &["L"], "loop_0").with_subgraph("body", reads_relu_out()),
            )
            .unwrap();
        let consumers: Vec<_> = graph.consumers("relu_out").iter().map(|n| n.index()).collect();
        assert_eq!(consumers, vec![NodeIndex(1), loop_index]);

        // relu_out loses its only explicit consumer but the body still reads it
        graph.remove_node(NodeIndex(1));
        let consumers: Vec<_> = graph.consumers("relu_out").iter().map(|n| n.index()).collect();
        assert_eq!(consumers, vec![loop_index]);
        assert!(graph.node_arg("relu_out").is_some());

        graph.remove_node(loop_index);
        assert!(graph.consumers("relu_out").is_empty());
    }

    #[test]
    fn test_add_subgraph_refreshes_implicit_inputs() {
        let mut graph = make_test_graph();

        graph
            .add_subgraph(NodeIndex(1), "body", reads_relu_out())
            .unwrap();
        let node = graph.node(NodeIndex(1)).unwrap();
        assert_eq!(node.implicit_inputs(), &["relu_out".to_string()]);
        // one explicit and one implicit use by the same node
        assert_eq!(graph.output_edge_count(NodeIndex(0)), 2);
        assert_eq!(graph.consumers("relu_out").len(), 1);

        graph
            .add_subgraph(NodeIndex(1), "body", Graph::new("empty"))
            .unwrap();
        assert!(graph.node(NodeIndex(1)).unwrap().implicit_inputs().is_empty());
        assert_eq!(graph.output_edge_count(NodeIndex(0)), 1);
    }
}
