//! Reference executor
//!
//! Evaluates a [`Graph`] node by node in topological order over `f32`
//! arrays. It exists to check that a rewrite preserves values: running a
//! graph before and after optimization must give identical outputs.
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::exec::Executor;
//!
//! let outputs = Executor::run(&graph, [("X", x)])?;
//! println!("{:?}", outputs["Y"]);
//! ```

pub mod kernels;

use indexmap::IndexMap;
use ndarray::ArrayD;

use crate::error::{GraphResult, TransformError};
use crate::graph::{Graph, Node};
use crate::pattern::ops::{
    ADD, BIAS_GELU, GELU, IDENTITY, MS_DOMAIN, MUL, ONNX_DOMAIN, ONNX_DOMAIN_ALIAS, RELU, SUB,
};

/// Tensor values keyed by slot name
pub type ValueMap = IndexMap<String, ArrayD<f32>>;

/// Graph interpreter
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// Run `graph` with the given feeds and return its outputs, in graph
    /// output order
    pub fn run<I, S>(graph: &Graph, feeds: I) -> GraphResult<ValueMap>
    where
        I: IntoIterator<Item = (S, ArrayD<f32>)>,
        S: Into<String>,
    {
        graph.resolve()?;

        let mut values: ValueMap = graph
            .initializers()
            .map(|(name, data)| (name.clone(), data.clone()))
            .collect();
        for (name, data) in feeds {
            values.insert(name.into(), data);
        }

        for input in graph.inputs() {
            let data = values
                .get(input)
                .ok_or_else(|| TransformError::MissingInput(input.clone()))?;
            let declared = graph.node_arg(input).and_then(|arg| arg.shape.as_ref());
            if let Some(shape) = declared {
                if !shape.accepts(data.shape()) {
                    return Err(TransformError::ShapeMismatch(format!(
                        "feed '{}' has shape {:?}, expected {}",
                        input,
                        data.shape(),
                        shape
                    )));
                }
            }
        }

        for index in graph.nodes_in_topological_order() {
            let Some(node) = graph.node(index) else {
                continue;
            };
            let result = Self::eval_node(node, &values)?;
            let output = node
                .outputs()
                .first()
                .ok_or_else(|| TransformError::InvalidNode(format!("{} has no output", node.name)))?;
            values.insert(output.clone(), result);
        }

        graph
            .outputs()
            .iter()
            .map(|name| {
                values
                    .get(name)
                    .cloned()
                    .map(|data| (name.clone(), data))
                    .ok_or_else(|| TransformError::MissingInput(name.clone()))
            })
            .collect()
    }

    fn eval_node(node: &Node, values: &ValueMap) -> GraphResult<ArrayD<f32>> {
        let args = node
            .inputs()
            .iter()
            .map(|name| {
                values
                    .get(name)
                    .ok_or_else(|| TransformError::MissingInput(name.clone()))
            })
            .collect::<GraphResult<Vec<_>>>()?;

        let onnx = node.domain == ONNX_DOMAIN || node.domain == ONNX_DOMAIN_ALIAS;
        match (node.op_type.as_str(), onnx) {
            (ADD, true) => binary(node, &args, kernels::add),
            (SUB, true) => binary(node, &args, kernels::sub),
            (MUL, true) => binary(node, &args, kernels::mul),
            (RELU, true) => unary(node, &args).map(kernels::relu),
            (IDENTITY, true) => unary(node, &args).map(|x| x.clone()),
            (GELU, false) if node.domain == MS_DOMAIN => unary(node, &args).map(kernels::gelu),
            (BIAS_GELU, false) if node.domain == MS_DOMAIN => {
                binary(node, &args, kernels::bias_gelu)
            }
            _ => Err(TransformError::UnsupportedOp {
                op_type: node.op_type.clone(),
                domain: node.domain.clone(),
            }),
        }
    }
}

fn unary<'a>(node: &Node, args: &[&'a ArrayD<f32>]) -> GraphResult<&'a ArrayD<f32>> {
    match args {
        [x] => Ok(*x),
        _ => Err(arity(node, 1, args.len())),
    }
}

fn binary<F>(node: &Node, args: &[&ArrayD<f32>], kernel: F) -> GraphResult<ArrayD<f32>>
where
    F: Fn(&ArrayD<f32>, &ArrayD<f32>) -> GraphResult<ArrayD<f32>>,
{
    match args {
        [a, b] => kernel(*a, *b),
        _ => Err(arity(node, 2, args.len())),
    }
}

fn arity(node: &Node, expected: usize, got: usize) -> TransformError {
    TransformError::InvalidNode(format!(
        "{} ({}) expects {} inputs, got {}",
        node.name, node.op_type, expected, got
    ))
}
