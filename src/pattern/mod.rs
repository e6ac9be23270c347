//! Pattern matching module for graph fusion
//!
//! This module decides *whether* a local rewrite applies; it never mutates
//! the graph. Rewriting is done by the passes in [`crate::transformers`].
//!
//! # Overview
//!
//! The matcher is anchored at an `Add` node and looks one step forward:
//!
//! ```text
//!   data ──┐
//!          Add ── Activation ── out     =>     data, bias ── Fused ── out
//!   bias ──┘
//! ```
//!
//! A successful match yields a [`FusionPlan`] carrying everything the
//! rewriter needs, with the operands already ordered `[data, bias]`.
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::pattern::{BiasActivationMatcher, ops::BIAS_GELU_RULE};
//!
//! let matcher = BiasActivationMatcher::new(&graph, &BIAS_GELU_RULE, &backends);
//! if let Some(plan) = matcher.match_index(index) {
//!     println!("fuse {} into {}", plan.add_node, plan.activation_node);
//! }
//! ```

pub mod matcher;
pub mod ops;

// Re-export main types
pub use matcher::{match_bias_activation, BiasActivationMatcher, FusionPlan};
pub use ops::{ActivationFusionRule, BIAS_GELU_RULE};
