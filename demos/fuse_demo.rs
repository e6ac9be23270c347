//! Bias-GELU fusion demo
//!
//! Builds a small `Add -> Gelu -> Add -> Gelu` graph, optimizes it and
//! checks the outputs are unchanged.
//!
//! Run with: cargo run --example fuse_demo -- level=extended log_level=debug

use std::env;
use std::time::Instant;

use peephole_fusion::prelude::*;

fn build_graph() -> GraphResult<Graph> {
    GraphBuilder::new("demo")
        .input("X", &[3, 2])
        .initializer("B0", array_from_vec(&[2], vec![0.5, -0.5])?)
        .initializer("B1", array_from_vec(&[2], vec![-1.0, 1.0])?)
        .node(
            make_node("Add", &["X", "B0"], &["s0"], "add_0")
                .with_version(7)
                .with_backend("cpu"),
        )
        .node(
            make_node("Gelu", &["s0"], &["h0"], "gelu_0")
                .with_domain("com.microsoft")
                .with_backend("cpu"),
        )
        .node(
            make_node("Add", &["B1", "h0"], &["s1"], "add_1")
                .with_version(7)
                .with_backend("cpu"),
        )
        .node(
            make_node("Gelu", &["s1"], &["Y"], "gelu_1")
                .with_domain("com.microsoft")
                .with_backend("cpu"),
        )
        .output("Y")
        .build()
}

fn print_graph(graph: &Graph) {
    for index in graph.nodes_in_topological_order() {
        if let Some(node) = graph.node(index) {
            let domain = if node.domain.is_empty() {
                "ai.onnx"
            } else {
                &node.domain
            };
            println!(
                "  {:<20} {}::{:<10} {:?} -> {:?} [{}]",
                node.name(),
                domain,
                node.op_type,
                node.inputs(),
                node.outputs(),
                node.backend
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = OptimizeOptions::from_pairs(args.iter().map(String::as_str))?;

    env_logger::Builder::new()
        .filter_level(options.log_severity)
        .init();

    let original = build_graph()?;
    let mut graph = original.clone();

    println!("## Before ({} nodes)", graph.node_count());
    print_graph(&graph);

    let start = Instant::now();
    let modified = optimize_graph(&mut graph, &options)?;
    let elapsed = start.elapsed();

    println!(
        "\n## After ({} nodes, modified={}, {:.1?})",
        graph.node_count(),
        modified,
        elapsed
    );
    print_graph(&graph);

    let x = array_from_vec(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    let expected = Executor::run(&original, [("X", x.clone())])?;
    let actual = Executor::run(&graph, [("X", x)])?;

    println!("\n## Outputs");
    println!("  Y = {:?}", actual["Y"].as_slice().unwrap_or_default());
    println!(
        "  bit-identical to unoptimized graph: {}",
        bitwise_eq(&expected["Y"], &actual["Y"])
    );

    Ok(())
}
