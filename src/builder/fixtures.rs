//! Test graphs shared across modules

use ndarray::{ArrayD, IxDyn};

use crate::graph::{make_node, Graph, NodeArg, NodeDef};
use crate::pattern::ops::{ADD, CPU_BACKEND, GELU, MS_DOMAIN, RELU};
use crate::tensor::{array_from_vec, Shape};

use super::GraphBuilder;

pub(crate) fn add_def(name: &str, a: &str, b: &str, out: &str) -> NodeDef {
    make_node(ADD, &[a, b], &[out], name)
        .with_version(7)
        .with_backend(CPU_BACKEND)
}

pub(crate) fn gelu_def(name: &str, input: &str, out: &str) -> NodeDef {
    make_node(GELU, &[input], &[out], name)
        .with_domain(MS_DOMAIN)
        .with_version(1)
        .with_backend(CPU_BACKEND)
}

/// `[[1, 2], [3, 4], [5, 6]]`
pub(crate) fn x_data() -> ArrayD<f32> {
    array_from_vec(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
}

pub(crate) fn ramp(dims: &[usize]) -> ArrayD<f32> {
    let len: usize = dims.iter().product();
    ArrayD::from_shape_vec(
        IxDyn(dims),
        (0..len).map(|i| 0.25 * i as f32 - 0.5).collect(),
    )
    .unwrap()
}

/// Knobs for an `X, B -> Add -> Gelu -> Y` graph
pub(crate) struct BiasGeluFixture {
    /// Shape of graph input X; `None` leaves it unknown
    pub x_dims: Option<Vec<i64>>,
    /// Shape of initializer B
    pub bias_dims: Vec<usize>,
    /// Wire B as the Add's first input
    pub bias_first: bool,
    pub add_backend: &'static str,
    pub gelu_backend: &'static str,
    pub add_version: i32,
    /// Register the Add output as a graph output
    pub expose_add_output: bool,
    /// Feed the Add output to an extra Relu as well
    pub extra_consumer: bool,
}

impl Default for BiasGeluFixture {
    fn default() -> Self {
        Self {
            x_dims: Some(vec![3, 2]),
            bias_dims: vec![2],
            bias_first: false,
            add_backend: CPU_BACKEND,
            gelu_backend: CPU_BACKEND,
            add_version: 7,
            expose_add_output: false,
            extra_consumer: false,
        }
    }
}

impl BiasGeluFixture {
    pub(crate) fn build(&self) -> Graph {
        let x = match &self.x_dims {
            Some(dims) => NodeArg::new("X").with_shape(Shape::from_fixed(dims)),
            None => NodeArg::new("X"),
        };
        let (a, b) = if self.bias_first { ("B", "X") } else { ("X", "B") };

        let mut builder = GraphBuilder::new("main")
            .input_arg(x)
            .initializer("B", ramp(&self.bias_dims))
            .node(
                add_def("add_0", a, b, "add_out")
                    .with_version(self.add_version)
                    .with_backend(self.add_backend),
            )
            .node(gelu_def("gelu_0", "add_out", "Y").with_backend(self.gelu_backend))
            .output("Y");

        if self.extra_consumer {
            builder = builder
                .node(make_node(RELU, &["add_out"], &["R"], "relu_0").with_backend(CPU_BACKEND))
                .output("R");
        }
        if self.expose_add_output {
            builder = builder.output("add_out");
        }

        builder.build().unwrap()
    }
}

/// Route `log` output through the test harness
pub(crate) fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}
