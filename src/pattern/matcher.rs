//! Bias + activation pattern matcher
//!
//! Decides whether an `Add` node and its single consumer form a fusible
//! `Add(data, bias) -> Activation` pair. Matching never mutates the graph.

use rustc_hash::FxHashSet;

use crate::graph::{
    is_supported_backend, is_supported_optype_version_and_domain, Graph, Node, NodeIndex,
};

use super::ops::{ActivationFusionRule, ADD, ONNX_DOMAIN};

/// Everything the rewriter needs to fuse one matched pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionPlan {
    /// Main-shaped operand of the add
    pub data_input: String,
    /// Rank-1 operand of the add
    pub bias_input: String,
    /// The matched add node
    pub add_node: NodeIndex,
    /// The add's single consumer
    pub activation_node: NodeIndex,
    /// Backend both nodes are assigned to
    pub target_backend: String,
}

/// Pattern matcher for `Add -> Activation` fusion
///
/// Preconditions are checked in a fixed order and the first failure ends
/// the match:
/// 1. `Add` at a supported version, on a compatible backend
/// 2. exactly one output edge
/// 3. exactly one input with a known rank-1 shape
/// 4. the consumer is the rule's activation on the same backend
/// 5. no add output is a graph output
pub struct BiasActivationMatcher<'a> {
    graph: &'a Graph,
    rule: &'a ActivationFusionRule,
    compatible_backends: &'a FxHashSet<String>,
}

impl<'a> BiasActivationMatcher<'a> {
    /// Create a matcher over `graph`
    pub fn new(
        graph: &'a Graph,
        rule: &'a ActivationFusionRule,
        compatible_backends: &'a FxHashSet<String>,
    ) -> Self {
        Self {
            graph,
            rule,
            compatible_backends,
        }
    }

    /// Match the pattern anchored at `node`
    pub fn match_node(&self, node: &Node) -> Option<FusionPlan> {
        if !is_supported_optype_version_and_domain(node, ADD, self.rule.add_versions, ONNX_DOMAIN)
            || !is_supported_backend(node, self.compatible_backends)
            || self.graph.output_edge_count(node.index()) != 1
        {
            return None;
        }

        let (data_input, bias_input) = self.split_bias(node)?;

        let next_index = *self.graph.output_nodes(node.index()).first()?;
        let next = self.graph.node(next_index)?;
        if !is_supported_optype_version_and_domain(
            next,
            self.rule.activation_op,
            self.rule.activation_versions,
            self.rule.activation_domain,
        ) || next.backend != node.backend
        {
            return None;
        }

        if !self.graph.graph_outputs_of_node(node.index()).is_empty() {
            log::trace!(
                "{}: output is a graph output, not fusing into {}",
                node.name,
                next.name
            );
            return None;
        }

        Some(FusionPlan {
            data_input,
            bias_input,
            add_node: node.index(),
            activation_node: next_index,
            target_backend: next.backend.clone(),
        })
    }

    /// Match the pattern anchored at the node with the given index
    pub fn match_index(&self, index: NodeIndex) -> Option<FusionPlan> {
        self.graph.node(index).and_then(|node| self.match_node(node))
    }

    /// Split the add's operands into `(data, bias)`
    ///
    /// Exactly one operand may have a known rank-1 shape. When both or
    /// neither do, the roles cannot be told apart and there is no split.
    fn split_bias(&self, node: &Node) -> Option<(String, String)> {
        let [first, second] = node.inputs() else {
            return None;
        };

        match (self.is_rank_one(first), self.is_rank_one(second)) {
            (false, true) => Some((first.clone(), second.clone())),
            (true, false) => Some((second.clone(), first.clone())),
            _ => {
                log::trace!("{}: ambiguous bias operand", node.name);
                None
            }
        }
    }

    fn is_rank_one(&self, slot: &str) -> bool {
        self.graph
            .node_arg(slot)
            .and_then(|arg| arg.rank())
            .map_or(false, |rank| rank == 1)
    }
}

/// Convenience function to match one node
pub fn match_bias_activation(
    graph: &Graph,
    node: &Node,
    rule: &ActivationFusionRule,
    compatible_backends: &FxHashSet<String>,
) -> Option<FusionPlan> {
    BiasActivationMatcher::new(graph, rule, compatible_backends).match_node(node)
}
