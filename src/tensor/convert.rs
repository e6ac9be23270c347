//! Tensor conversion utilities
//!
//! Build `ndarray` values from plain data and compare them exactly.

use ndarray::{Array, ArrayD, IxDyn};

use crate::error::{GraphResult, TransformError};

/// Build an f32 array of the given extents from row-major data
pub fn array_from_vec(extents: &[usize], data: Vec<f32>) -> GraphResult<ArrayD<f32>> {
    let expected_len: usize = extents.iter().product();
    if data.len() != expected_len {
        return Err(TransformError::ShapeMismatch(format!(
            "Data length {} does not match shape {:?} (expected {})",
            data.len(),
            extents,
            expected_len
        )));
    }

    Ok(Array::from_shape_vec(IxDyn(extents), data)?)
}

/// Build a rank-0 array
pub fn scalar_array(value: f32) -> ArrayD<f32> {
    ArrayD::from_elem(IxDyn(&[]), value)
}

/// True when both arrays have the same shape and bit-identical elements
pub fn bitwise_eq(a: &ArrayD<f32>, b: &ArrayD<f32>) -> bool {
    a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_from_vec() {
        let arr = array_from_vec(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr[[2, 1]], 6.0);
    }

    #[test]
    fn test_array_from_vec_length_mismatch() {
        let err = array_from_vec(&[3, 2], vec![1.0; 5]).unwrap_err();
        assert!(matches!(err, TransformError::ShapeMismatch(_)));
    }

    #[test]
    fn test_scalar_array() {
        let s = scalar_array(1.5);
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.sum(), 1.5);
    }

    #[test]
    fn test_bitwise_eq_distinguishes_signed_zero() {
        let pos = array_from_vec(&[1], vec![0.0]).unwrap();
        let neg = array_from_vec(&[1], vec![-0.0]).unwrap();
        assert_eq!(pos, neg);
        assert!(!bitwise_eq(&pos, &neg));
        assert!(bitwise_eq(&pos, &pos.clone()));
    }
}
