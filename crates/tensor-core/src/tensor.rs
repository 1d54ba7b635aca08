// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Immutable weight tensors.

use crate::{DType, Shape, TensorError};
use std::sync::Arc;

/// An immutable, n-dimensional tensor stored as little-endian bytes.
///
/// The buffer is reference counted: cloning a `Tensor` never copies weight
/// data, which lets a rewritten graph share every untouched weight with the
/// graph it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: Arc<[u8]>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            data: vec![0u8; size].into(),
        }
    }

    /// Creates a tensor from raw little-endian bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: Vec<u8>) -> Result<Self, TensorError> {
        match shape.checked_size_bytes(dtype) {
            Some(expected) if expected == data.len() => Ok(Self {
                shape,
                dtype,
                data: data.into(),
            }),
            expected => Err(TensorError::BufferSizeMismatch {
                expected: expected.unwrap_or(usize::MAX),
                actual: data.len(),
            }),
        }
    }

    /// Creates an `f32` tensor from a slice of values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        let expected_elements = shape.num_elements();
        if values.len() != expected_elements {
            return Err(TensorError::BufferSizeMismatch {
                expected: expected_elements * DType::F32.size_bytes(),
                actual: values.len() * DType::F32.size_bytes(),
            });
        }
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Ok(Self {
            shape,
            dtype: DType::F32,
            data: bytes.into(),
        })
    }

    /// Creates an `f32` tensor where every element equals `value`.
    pub fn filled_f32(shape: Shape, value: f32) -> Self {
        let n = shape.num_elements();
        let bytes: Vec<u8> = std::iter::repeat(value.to_le_bytes())
            .take(n)
            .flatten()
            .collect();
        Self {
            shape,
            dtype: DType::F32,
            data: bytes.into(),
        }
    }

    /// Creates an `f32` tensor whose element `i` (row-major) is `f(i)`.
    pub fn from_fn_f32(shape: Shape, mut f: impl FnMut(usize) -> f32) -> Self {
        let n = shape.num_elements();
        let mut bytes = Vec::with_capacity(n * DType::F32.size_bytes());
        for i in 0..n {
            bytes.extend_from_slice(&f(i).to_le_bytes());
        }
        Self {
            shape,
            dtype: DType::F32,
            data: bytes.into(),
        }
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if both tensors share the same buffer.
    pub fn shares_buffer(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Decodes the buffer as `f32` values.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "to_f32_vec",
                dtype: self.dtype,
            });
        }
        Ok(self
            .data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert!(t.to_f32_vec().unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_f32_roundtrip() {
        let data = vec![1.0f32, -2.5, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_f32(Shape::matrix(2, 3), &data).unwrap();
        assert_eq!(t.to_f32_vec().unwrap(), data);
    }

    #[test]
    fn test_from_f32_wrong_len() {
        let result = Tensor::from_f32(Shape::vector(4), &[1.0, 2.0]);
        assert!(matches!(result, Err(TensorError::BufferSizeMismatch { .. })));
    }

    #[test]
    fn test_from_bytes_size_mismatch() {
        let result = Tensor::from_bytes(Shape::matrix(2, 3), DType::F32, vec![0u8; 10]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_bytes_oversized_shape() {
        let shape = Shape::new(vec![usize::MAX, 2]);
        let result = Tensor::from_bytes(shape, DType::F32, vec![0u8; 8]);
        assert!(matches!(
            result,
            Err(TensorError::BufferSizeMismatch { expected: usize::MAX, actual: 8 })
        ));
    }

    #[test]
    fn test_filled() {
        let t = Tensor::filled_f32(Shape::vector(5), 1.0);
        assert_eq!(t.to_f32_vec().unwrap(), vec![1.0; 5]);
    }

    #[test]
    fn test_from_fn() {
        let t = Tensor::from_fn_f32(Shape::matrix(2, 2), |i| i as f32 * 2.0);
        assert_eq!(t.to_f32_vec().unwrap(), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(t.size_bytes(), 16);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let t = Tensor::filled_f32(Shape::vector(8), 0.5);
        let c = t.clone();
        assert!(t.shares_buffer(&c));
    }

    #[test]
    fn test_to_f32_wrong_dtype() {
        let t = Tensor::zeros(Shape::vector(4), DType::I8);
        assert!(matches!(
            t.to_f32_vec(),
            Err(TensorError::UnsupportedDType { .. })
        ));
    }
}
