// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Shape and weight-tensor primitives shared by the layer-graph crates.
//!
//! This crate provides:
//! - [`Shape`] — activation and weight shape descriptors, including
//!   channel-last helpers and broadcasting.
//! - [`DType`] — supported element data types (f32, f16, bf16, i8).
//! - [`Tensor`] — an immutable weight buffer that is cheap to clone, so a
//!   rewritten graph can share weights with the graph it was built from.

mod dtype;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::Tensor;
