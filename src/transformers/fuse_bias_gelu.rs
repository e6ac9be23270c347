//! Bias-GELU fusion transformer
//!
//! Rewrites `Add(data, bias) -> Gelu` into a single `com.microsoft::BiasGelu`
//! node taking `[data, bias]`:
//!
//! ```text
//!   X ──┐                         X ──┐
//!       Add ── Gelu ── Y   =>         BiasGelu ── Y
//!   B ──┘                         B ──┘
//! ```
//!
//! The bias is told apart from the data operand by shape: exactly one Add
//! input must have a known rank-1 shape. Matching lives in
//! [`crate::pattern::matcher`]; this module performs the rewrite.

use std::cell::Cell;

use log::Level;
use rustc_hash::FxHashSet;

use crate::error::GraphResult;
use crate::graph::{Graph, NodeDef};
use crate::logging::Logger;
use crate::pattern::ops::{BIAS_GELU_BACKENDS, BIAS_GELU_RULE};
use crate::pattern::{ActivationFusionRule, BiasActivationMatcher, FusionPlan};
use crate::traits::GraphTransformer;
use crate::transform::TransformStats;

/// Fuses Bias + Gelu
///
/// Transforms:
///   Add(X, B) -> Gelu
/// Into:
///   BiasGelu(X, B)
#[derive(Debug)]
pub struct FuseBiasGelu {
    compatible_backends: FxHashSet<String>,
    rule: ActivationFusionRule,
    stats: Cell<TransformStats>,
}

impl Default for FuseBiasGelu {
    fn default() -> Self {
        Self::new(BIAS_GELU_BACKENDS.iter().copied())
    }
}

impl FuseBiasGelu {
    /// Name the transformer registers under
    pub const NAME: &'static str = "BiasGeluFusion";

    /// Create the transformer for the given backends; none means all
    pub fn new<I, S>(compatible_backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            compatible_backends: compatible_backends.into_iter().map(Into::into).collect(),
            rule: BIAS_GELU_RULE,
            stats: Cell::new(TransformStats::default()),
        }
    }

    /// Counters accumulated since creation or the last reset
    pub fn stats(&self) -> TransformStats {
        self.stats.get()
    }

    /// Clear the accumulated counters
    pub fn reset_stats(&self) {
        self.stats.set(TransformStats::default());
    }

    // ========================================================================
    // Rewrite
    // ========================================================================

    /// Replace the matched pair by one fused node
    ///
    /// Fails without changing the graph's dataflow if any step of the
    /// replacement is rejected; a half-inserted fused node is removed again.
    fn fuse(&self, graph: &mut Graph, plan: &FusionPlan) -> GraphResult<String> {
        let name = graph.generate_node_name(self.rule.fused_op);
        let def = NodeDef::new(self.rule.fused_op, name.clone())
            .with_domain(self.rule.fused_domain)
            .with_version(self.rule.fused_version)
            .with_description(self.rule.fused_description)
            .with_inputs([plan.data_input.as_str(), plan.bias_input.as_str()])
            .with_backend(plan.target_backend.as_str());

        let fused = graph.add_node(def)?;
        if let Err(err) =
            graph.finalize_node_fusion(&[plan.add_node, plan.activation_node], fused)
        {
            graph.remove_node(fused);
            return Err(err);
        }

        let mut stats = self.stats.get();
        stats.record_fusion(2);
        self.stats.set(stats);

        Ok(name)
    }
}

impl GraphTransformer for FuseBiasGelu {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compatible_backends(&self) -> &FxHashSet<String> {
        &self.compatible_backends
    }

    fn apply_impl(&self, graph: &mut Graph, graph_level: usize, logger: &Logger) -> GraphResult<bool> {
        let mut modified = false;

        for index in graph.nodes_in_topological_order() {
            if !graph.has_node(index) {
                continue;
            }

            modified |= self.recurse(graph, index, graph_level, logger)?;

            let plan = BiasActivationMatcher::new(graph, &self.rule, &self.compatible_backends)
                .match_index(index);
            let Some(plan) = plan else {
                continue;
            };

            match self.fuse(graph, &plan) {
                Ok(name) => {
                    pass_log!(
                        logger,
                        Level::Debug,
                        "{}: fused {} + {} into {} on '{}'",
                        graph.name(),
                        plan.add_node,
                        plan.activation_node,
                        name,
                        plan.target_backend
                    );
                    modified = true;
                }
                Err(err) => {
                    pass_log!(
                        logger,
                        Level::Warn,
                        "{}: skipped fusion at {}: {}",
                        graph.name(),
                        plan.add_node,
                        err
                    );
                }
            }
        }

        Ok(modified)
    }
}
