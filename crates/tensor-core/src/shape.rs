// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.
//!
//! Activation shapes carry the batch dimension first. Image activations are
//! channel-last: `[batch, height, width, channels]`.

use std::fmt;

/// Describes the dimensionality of an activation or a weight tensor.
///
/// Shapes are immutable once created and provide convenience methods for
/// element counts, channel-last accessors and broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![1, 224, 224, 3]);
    /// assert_eq!(s.rank(), 4);
    /// assert_eq!(s.num_elements(), 224 * 224 * 3);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Creates a channel-last image shape `[batch, height, width, channels]`.
    pub fn nhwc(batch: usize, height: usize, width: usize, channels: usize) -> Self {
        Self {
            dims: vec![batch, height, width, channels],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns the last dimension (channels for channel-last activations).
    pub fn last(&self) -> Option<usize> {
        self.dims.last().copied()
    }

    /// Returns the leading (batch) dimension.
    pub fn batch(&self) -> Option<usize> {
        self.dims.first().copied()
    }

    /// Returns the dimensions after the batch dimension.
    pub fn without_batch(&self) -> &[usize] {
        self.dims.get(1..).unwrap_or(&[])
    }

    /// Returns a shape with `batch` prepended to `dims`.
    pub fn with_batch(batch: usize, dims: &[usize]) -> Self {
        let mut all = Vec::with_capacity(dims.len() + 1);
        all.push(batch);
        all.extend_from_slice(dims);
        Self { dims: all }
    }

    /// Returns a copy with the last dimension replaced.
    pub fn with_last(&self, value: usize) -> Self {
        let mut dims = self.dims.clone();
        if let Some(last) = dims.last_mut() {
            *last = value;
        }
        Self { dims }
    }

    /// Computes the memory footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: super::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }

    /// Like [`Shape::num_elements`], but `None` on overflow.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Like [`Shape::size_bytes`], but `None` on overflow.
    pub fn checked_size_bytes(&self, dtype: super::DType) -> Option<usize> {
        self.checked_num_elements()?.checked_mul(dtype.size_bytes())
    }

    /// Returns the broadcast of two shapes, or `None` if incompatible.
    ///
    /// Dimensions are aligned from the right; each pair must be equal or
    /// one of them must be 1.
    ///
    /// ```
    /// use tensor_core::Shape;
    /// let x = Shape::nhwc(1, 56, 56, 96);
    /// let se = Shape::nhwc(1, 1, 1, 96);
    /// assert_eq!(x.broadcast(&se), Some(x.clone()));
    /// ```
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let rank = self.rank().max(other.rank());
        let mut out = vec![0usize; rank];
        for i in 0..rank {
            let a = dim_from_right(&self.dims, i);
            let b = dim_from_right(&other.dims, i);
            out[rank - 1 - i] = match (a, b) {
                (x, y) if x == y => x,
                (1, y) => y,
                (x, 1) => x,
                _ => return None,
            };
        }
        Some(Shape::new(out))
    }
}

fn dim_from_right(dims: &[usize], i: usize) -> usize {
    if i < dims.len() {
        dims[dims.len() - 1 - i]
    } else {
        1
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}
