//! Graph map types and node records
//!
//! Defines the core data structures for graph storage and traversal.

use std::fmt;

use indexmap::IndexMap;
use ndarray::ArrayD;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::tensor::Shape;

use super::context::Graph;

/// Stable handle to a node slot in a graph's arena
///
/// Indices are never reused, so an index to a removed node keeps resolving
/// to "absent" instead of to an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Raw arena position
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named value slot
#[derive(Debug, Clone, PartialEq)]
pub struct NodeArg {
    /// Slot name, unique within the graph
    pub name: String,
    /// Static shape, if known
    pub shape: Option<Shape>,
}

impl NodeArg {
    /// Create a slot with no shape information
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
        }
    }

    /// Attach a static shape
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Rank of the static shape, if known
    pub fn rank(&self) -> Option<usize> {
        self.shape.as_ref().map(Shape::rank)
    }
}

/// A node living in a graph's arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) index: NodeIndex,
    pub(crate) name: String,
    /// Operator type (e.g. `Add`)
    pub op_type: String,
    /// Operator domain; empty is the default ONNX domain
    pub domain: String,
    /// Operator-set version the node was resolved against
    pub since_version: i32,
    /// Free-form description
    pub description: String,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
    /// Outer-scope values read by the nested graphs
    pub(crate) implicit_inputs: Vec<String>,
    /// Assigned compute backend; empty when unassigned
    pub backend: String,
    pub(crate) subgraphs: SubgraphMap,
}

impl Node {
    pub(crate) fn from_def(index: NodeIndex, def: NodeDef) -> Self {
        let implicit_inputs = outer_scope_reads(&def.subgraphs);
        Self {
            index,
            name: def.name,
            op_type: def.op_type,
            domain: def.domain,
            since_version: def.since_version,
            description: def.description,
            inputs: def.inputs,
            outputs: def.outputs,
            implicit_inputs,
            backend: def.backend,
            subgraphs: def.subgraphs,
        }
    }

    /// Arena index
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Unique node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered input slot names
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Ordered output slot names
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Values from enclosing scopes that the nested graphs read
    ///
    /// Each one is an input of this node as far as edges and ordering go.
    pub fn implicit_inputs(&self) -> &[String] {
        &self.implicit_inputs
    }

    /// Explicit and implicit inputs, empty slots skipped
    pub(crate) fn all_inputs(&self) -> impl Iterator<Item = &String> {
        self.inputs
            .iter()
            .chain(self.implicit_inputs.iter())
            .filter(|i| !i.is_empty())
    }

    /// Nested graphs keyed by attribute name (control-flow bodies)
    pub fn subgraphs(&self) -> &SubgraphMap {
        &self.subgraphs
    }

    /// Whether the node owns nested graphs
    pub fn has_subgraphs(&self) -> bool {
        !self.subgraphs.is_empty()
    }
}

/// Description of a node to be added to a graph
#[derive(Debug, Clone, Default)]
pub struct NodeDef {
    pub(crate) name: String,
    pub(crate) op_type: String,
    pub(crate) domain: String,
    pub(crate) since_version: i32,
    pub(crate) description: String,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
    pub(crate) backend: String,
    pub(crate) subgraphs: SubgraphMap,
}

impl NodeDef {
    /// Start a definition for `op_type` named `name`
    pub fn new(op_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            name: name.into(),
            since_version: 1,
            ..Default::default()
        }
    }

    /// Set input slots
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set output slots
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the operator domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the operator-set version
    pub fn with_version(mut self, since_version: i32) -> Self {
        self.since_version = since_version;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Assign a backend
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Attach a nested graph under an attribute name
    pub fn with_subgraph(mut self, attribute: impl Into<String>, graph: Graph) -> Self {
        self.subgraphs.insert(attribute.into(), graph);
        self
    }
}

/// Outer-scope names read by any of `subgraphs`, in first-read order
pub(crate) fn outer_scope_reads(subgraphs: &SubgraphMap) -> Vec<String> {
    let mut reads = Vec::new();
    for name in subgraphs.values().flat_map(Graph::outer_scope_reads) {
        if !reads.contains(&name) {
            reads.push(name);
        }
    }
    reads
}

/// Shorthand for a node definition with inputs and outputs
pub fn make_node(op_type: &str, inputs: &[&str], outputs: &[&str], name: &str) -> NodeDef {
    NodeDef::new(op_type, name)
        .with_inputs(inputs.iter().copied())
        .with_outputs(outputs.iter().copied())
}

/// Type alias for producer map: slot name → producer node
pub type ProducerMap = FxHashMap<String, NodeIndex>;

/// Type alias for consumer map: slot name → consumer nodes (one entry per use)
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerMap = FxHashMap<String, SmallVec<[NodeIndex; 4]>>;

/// Type alias for node name map: node name → node index
pub type NodeNameMap = FxHashMap<String, NodeIndex>;

/// Type alias for node arg map: slot name → NodeArg (insertion order preserved)
pub type NodeArgMap = IndexMap<String, NodeArg>;

/// Type alias for initializer map: slot name → constant data
pub type InitializerMap = FxHashMap<String, ArrayD<f32>>;

/// Type alias for nested graphs: attribute name → Graph
pub type SubgraphMap = IndexMap<String, Graph>;
