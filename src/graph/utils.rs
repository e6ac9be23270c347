//! Node predicates shared by transformers

use rustc_hash::FxHashSet;

use super::maps::Node;

/// Domain of the standard ONNX operator set
pub const ONNX_DOMAIN: &str = "";
/// Alternate spelling of [`ONNX_DOMAIN`]
pub const ONNX_DOMAIN_ALIAS: &str = "ai.onnx";

fn canonical_domain(domain: &str) -> &str {
    if domain == ONNX_DOMAIN_ALIAS {
        ONNX_DOMAIN
    } else {
        domain
    }
}

/// Check op type, operator-set version and domain of a node
pub fn is_supported_optype_version_and_domain(
    node: &Node,
    op_type: &str,
    versions: &[i32],
    domain: &str,
) -> bool {
    node.op_type == op_type
        && versions.contains(&node.since_version)
        && canonical_domain(&node.domain) == canonical_domain(domain)
}

/// Check the node's backend against a compatible set; an empty set accepts
/// every backend
pub fn is_supported_backend(node: &Node, compatible_backends: &FxHashSet<String>) -> bool {
    compatible_backends.is_empty() || compatible_backends.contains(&node.backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::maps::make_node;
    use crate::graph::Graph;

    fn single_node(domain: &str, version: i32, backend: &str) -> Graph {
        let mut graph = Graph::new("g");
        graph
            .add_node(
                make_node("Add", &["A", "B"], &["C"], "add_0")
                    .with_domain(domain)
                    .with_version(version)
                    .with_backend(backend),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_optype_version_domain() {
        let graph = single_node("", 7, "cpu");
        let node = graph.node_by_name("add_0").unwrap();

        assert!(is_supported_optype_version_and_domain(node, "Add", &[7], ""));
        assert!(is_supported_optype_version_and_domain(node, "Add", &[7], "ai.onnx"));
        assert!(!is_supported_optype_version_and_domain(node, "Add", &[13], ""));
        assert!(!is_supported_optype_version_and_domain(node, "Sub", &[7], ""));
        assert!(!is_supported_optype_version_and_domain(
            node,
            "Add",
            &[7],
            "com.microsoft"
        ));
    }

    #[test]
    fn test_alias_domain_on_node() {
        let graph = single_node("ai.onnx", 7, "cpu");
        let node = graph.node_by_name("add_0").unwrap();
        assert!(is_supported_optype_version_and_domain(node, "Add", &[7], ""));
    }

    #[test]
    fn test_supported_backend() {
        let graph = single_node("", 7, "cpu");
        let node = graph.node_by_name("add_0").unwrap();

        let mut compatible = FxHashSet::default();
        assert!(is_supported_backend(node, &compatible));

        compatible.insert("cuda".to_string());
        assert!(!is_supported_backend(node, &compatible));

        compatible.insert("cpu".to_string());
        assert!(is_supported_backend(node, &compatible));
    }
}
