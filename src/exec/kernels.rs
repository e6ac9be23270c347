//! Elementwise kernels over `ArrayD<f32>`

use std::f32::consts::FRAC_1_SQRT_2;

use ndarray::{ArrayD, IxDyn, Zip};

use crate::error::{GraphResult, TransformError};
use crate::tensor::broadcast_shape;

/// Apply `op` elementwise after broadcasting both operands to a common shape
pub fn broadcast_binary<F>(a: &ArrayD<f32>, b: &ArrayD<f32>, op: F) -> GraphResult<ArrayD<f32>>
where
    F: Fn(f32, f32) -> f32,
{
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let dim = IxDyn(&shape);

    let lhs = a.broadcast(dim.clone()).ok_or_else(|| mismatch(a, b))?;
    let rhs = b.broadcast(dim).ok_or_else(|| mismatch(a, b))?;

    Ok(Zip::from(&lhs).and(&rhs).map_collect(|&x, &y| op(x, y)))
}

fn mismatch(a: &ArrayD<f32>, b: &ArrayD<f32>) -> TransformError {
    TransformError::ShapeMismatch(format!(
        "cannot broadcast {:?} with {:?}",
        a.shape(),
        b.shape()
    ))
}

/// Elementwise sum
pub fn add(a: &ArrayD<f32>, b: &ArrayD<f32>) -> GraphResult<ArrayD<f32>> {
    broadcast_binary(a, b, |x, y| x + y)
}

/// Elementwise difference
pub fn sub(a: &ArrayD<f32>, b: &ArrayD<f32>) -> GraphResult<ArrayD<f32>> {
    broadcast_binary(a, b, |x, y| x - y)
}

/// Elementwise product
pub fn mul(a: &ArrayD<f32>, b: &ArrayD<f32>) -> GraphResult<ArrayD<f32>> {
    broadcast_binary(a, b, |x, y| x * y)
}

/// `max(x, 0)`
pub fn relu(x: &ArrayD<f32>) -> ArrayD<f32> {
    x.mapv(|v| v.max(0.0))
}

/// Error function, Abramowitz & Stegun 7.1.26 (max abs error ~1.5e-7)
pub fn erf(x: f32) -> f32 {
    const P: f32 = 0.327_591_1;
    const A1: f32 = 0.254_829_6;
    const A2: f32 = -0.284_496_74;
    const A3: f32 = 1.421_413_7;
    const A4: f32 = -1.453_152;
    const A5: f32 = 1.061_405_4;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let poly = t * (A1 + t * (A2 + t * (A3 + t * (A4 + t * A5))));

    sign * (1.0 - poly * (-x * x).exp())
}

/// Exact (erf) form of GELU for one value
#[inline]
pub fn gelu_scalar(x: f32) -> f32 {
    0.5 * x * (1.0 + erf(x * FRAC_1_SQRT_2))
}

/// Elementwise GELU
pub fn gelu(x: &ArrayD<f32>) -> ArrayD<f32> {
    x.mapv(gelu_scalar)
}

/// `gelu(data + bias)`, sharing the add and GELU kernels with the unfused path
pub fn bias_gelu(data: &ArrayD<f32>, bias: &ArrayD<f32>) -> GraphResult<ArrayD<f32>> {
    if bias.ndim() != 1 {
        return Err(TransformError::ShapeMismatch(format!(
            "bias must be rank 1, got shape {:?}",
            bias.shape()
        )));
    }
    Ok(gelu(&add(data, bias)?))
}
