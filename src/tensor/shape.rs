//! Shape utilities for graph values
//!
//! Static shapes as recorded on value slots, plus the broadcasting rules the
//! reference executor needs.

use std::fmt;

use crate::error::{GraphResult, TransformError};

/// A single dimension of a static shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Known extent
    Fixed(i64),
    /// Named symbolic extent (e.g. `batch`)
    Symbolic(String),
    /// Dimension exists but its extent is unknown
    Unknown,
}

impl Dim {
    /// Fixed extent, if known
    pub fn value(&self) -> Option<i64> {
        match self {
            Dim::Fixed(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(v) => write!(f, "{}", v),
            Dim::Symbolic(name) => f.write_str(name),
            Dim::Unknown => f.write_str("?"),
        }
    }
}

/// Static shape of a value slot
///
/// The rank is always known once a `Shape` exists; individual dims may not be.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    /// Create a shape from dims
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    /// Create a fully static shape
    pub fn from_fixed(dims: &[i64]) -> Self {
        Self {
            dims: dims.iter().map(|&d| Dim::Fixed(d)).collect(),
        }
    }

    /// Create a shape from concrete array extents
    pub fn from_extents(extents: &[usize]) -> Self {
        Self {
            dims: extents.iter().map(|&d| Dim::Fixed(d as i64)).collect(),
        }
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The dims
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// True when every dim has a non-negative fixed extent
    pub fn is_static(&self) -> bool {
        self.dims
            .iter()
            .all(|d| matches!(d, Dim::Fixed(v) if *v >= 0))
    }

    /// Concrete extents, if the shape is fully static
    pub fn to_extents(&self) -> Option<Vec<usize>> {
        self.dims
            .iter()
            .map(|d| match d {
                Dim::Fixed(v) if *v >= 0 => Some(*v as usize),
                _ => None,
            })
            .collect()
    }

    /// Check concrete extents against this shape; symbolic and unknown dims
    /// accept any extent
    pub fn accepts(&self, extents: &[usize]) -> bool {
        self.dims.len() == extents.len()
            && self.dims.iter().zip(extents).all(|(d, &e)| match d {
                Dim::Fixed(v) => *v == e as i64,
                _ => true,
            })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", dim)?;
        }
        f.write_str("]")
    }
}

/// Check if two concrete shapes are broadcastable
pub fn is_broadcastable(shape_a: &[usize], shape_b: &[usize]) -> bool {
    shape_a
        .iter()
        .rev()
        .zip(shape_b.iter().rev())
        .all(|(&a, &b)| a == b || a == 1 || b == 1)
}

/// Compute the broadcast output shape of two concrete shapes
pub fn broadcast_shape(shape_a: &[usize], shape_b: &[usize]) -> GraphResult<Vec<usize>> {
    if !is_broadcastable(shape_a, shape_b) {
        return Err(TransformError::ShapeMismatch(format!(
            "Shapes {:?} and {:?} are not broadcastable",
            shape_a, shape_b
        )));
    }

    let max_len = shape_a.len().max(shape_b.len());
    let mut result = vec![1usize; max_len];

    // Align from trailing dimensions
    for i in 0..max_len {
        let dim_a = shape_a.len().checked_sub(i + 1).map_or(1, |idx| shape_a[idx]);
        let dim_b = shape_b.len().checked_sub(i + 1).map_or(1, |idx| shape_b[idx]);
        result[max_len - 1 - i] = if dim_a == 1 { dim_b } else { dim_a };
    }

    Ok(result)
}
