//! Tensor utilities for graph values
//!
//! This module provides:
//! - Static shapes recorded on value slots (`shape`)
//! - Conversion helpers between plain vectors and ndarray (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::tensor::{Shape, array_from_vec};
//!
//! let shape = Shape::from_fixed(&[3, 2]);
//! assert_eq!(shape.rank(), 2);
//!
//! let x = array_from_vec(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! ```

pub mod convert;
pub mod shape;

// Re-export commonly used items
pub use convert::{array_from_vec, bitwise_eq, scalar_array};
pub use shape::{broadcast_shape, is_broadcastable, Dim, Shape};
