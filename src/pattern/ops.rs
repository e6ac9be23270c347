//! Operator names, domains and fusion rules
//!
//! Constants used to recognise nodes, plus the static description of the
//! Add → activation patterns the fusion pass knows how to rewrite.

pub use crate::graph::utils::{ONNX_DOMAIN, ONNX_DOMAIN_ALIAS};

/// Microsoft contrib operator domain
pub const MS_DOMAIN: &str = "com.microsoft";

// ============================================================================
// Operator types
// ============================================================================

/// Elementwise addition
pub const ADD: &str = "Add";
/// Elementwise subtraction
pub const SUB: &str = "Sub";
/// Elementwise multiplication
pub const MUL: &str = "Mul";
/// Rectified linear unit
pub const RELU: &str = "Relu";
/// Identity
pub const IDENTITY: &str = "Identity";
/// Gaussian error linear unit (contrib domain)
pub const GELU: &str = "Gelu";
/// Fused bias-add + GELU (contrib domain)
pub const BIAS_GELU: &str = "BiasGelu";

// ============================================================================
// Backends
// ============================================================================

/// Reference CPU backend tag
pub const CPU_BACKEND: &str = "cpu";
/// CUDA backend tag
pub const CUDA_BACKEND: &str = "cuda";

/// Backends that ship a fused bias-GELU kernel
pub const BIAS_GELU_BACKENDS: &[&str] = &[CPU_BACKEND, CUDA_BACKEND];

// ============================================================================
// Fusion rules
// ============================================================================

/// Static description of an `Add(data, bias) -> Activation` fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationFusionRule {
    /// Accepted operator-set versions of the `Add` node
    pub add_versions: &'static [i32],
    /// Activation operator type
    pub activation_op: &'static str,
    /// Accepted operator-set versions of the activation
    pub activation_versions: &'static [i32],
    /// Activation operator domain
    pub activation_domain: &'static str,
    /// Fused operator type
    pub fused_op: &'static str,
    /// Fused operator domain
    pub fused_domain: &'static str,
    /// Operator-set version assigned to the fused node
    pub fused_version: i32,
    /// Description attached to fused nodes
    pub fused_description: &'static str,
}

/// `Add` (opset 7) + `com.microsoft::Gelu` (v1) → `com.microsoft::BiasGelu`
pub const BIAS_GELU_RULE: ActivationFusionRule = ActivationFusionRule {
    add_versions: &[7],
    activation_op: GELU,
    activation_versions: &[1],
    activation_domain: MS_DOMAIN,
    fused_op: BIAS_GELU,
    fused_domain: MS_DOMAIN,
    fused_version: 1,
    fused_description: "fused Add and Gelu",
};
