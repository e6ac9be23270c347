//! Graph builder
//!
//! Fluent construction of graphs for tests, benches and demos.

use ndarray::ArrayD;

use crate::error::GraphResult;
use crate::graph::{Graph, NodeArg, NodeDef};
use crate::tensor::Shape;

/// Fluent builder for [`Graph`]
///
/// Inputs and initializers are registered first, then nodes in the given
/// order, then shapes of intermediate slots and graph outputs. `build`
/// rejects cyclic graphs.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    name: String,
    inputs: Vec<NodeArg>,
    initializers: Vec<(String, ArrayD<f32>)>,
    nodes: Vec<NodeDef>,
    value_infos: Vec<(String, Shape)>,
    outputs: Vec<String>,
}

impl GraphBuilder {
    /// Create a builder for a graph named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a graph input with a fully static shape
    pub fn input(self, name: &str, dims: &[i64]) -> Self {
        self.input_arg(NodeArg::new(name).with_shape(Shape::from_fixed(dims)))
    }

    /// Add a graph input
    pub fn input_arg(mut self, arg: NodeArg) -> Self {
        self.inputs.push(arg);
        self
    }

    /// Add an initializer
    pub fn initializer(mut self, name: &str, data: ArrayD<f32>) -> Self {
        self.initializers.push((name.to_string(), data));
        self
    }

    /// Record the static shape of an intermediate slot
    pub fn value_info(mut self, name: &str, shape: Shape) -> Self {
        self.value_infos.push((name.to_string(), shape));
        self
    }

    /// Add a node
    pub fn node(mut self, def: NodeDef) -> Self {
        self.nodes.push(def);
        self
    }

    /// Declare a graph output
    pub fn output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self
    }

    /// Assemble and validate the graph
    pub fn build(self) -> GraphResult<Graph> {
        let mut graph = Graph::new(self.name);

        for arg in self.inputs {
            graph.add_input(arg);
        }
        for (name, data) in self.initializers {
            graph.set_initializer(&name, data);
        }
        for def in self.nodes {
            graph.add_node(def)?;
        }
        for (name, shape) in self.value_infos {
            graph.set_shape(&name, Some(shape));
        }
        for name in &self.outputs {
            graph.add_output(name);
        }

        graph.resolve()?;
        Ok(graph)
    }
}
