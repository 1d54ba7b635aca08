// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # layer-graph
//!
//! A small intermediate representation for image-classification networks.
//!
//! - [`Op`] — the transform a layer applies (shape inference + weight shapes).
//! - [`Node`] — a named layer with ordered inputs, output shape and weights.
//! - [`ModelGraph`] — the model as a topologically ordered DAG, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`GraphBuilder`] — builds validated graphs by applying ops to nodes
//!   already in the graph.
//! - [`render_summary`] — the layer table written next to stored models.
//!
//! # Example
//! ```
//! use layer_graph::{GraphBuilder, Op};
//! use tensor_core::Shape;
//!
//! let mut b = GraphBuilder::new("tiny");
//! let x = b.input("input_1", Shape::nhwc(1, 8, 8, 3)).unwrap();
//! let y = b.add("pool", Op::GlobalAveragePooling2D, &[x]).unwrap();
//! let graph = b.finish(y).unwrap();
//! assert_eq!(graph.output().output_shape, Shape::matrix(1, 3));
//! ```

mod builder;
mod error;
pub mod graph;
mod node;
mod op;
mod summary;

pub use builder::{GraphBuilder, NodeRef};
pub use error::GraphError;
pub use graph::{GraphState, Loaded, ModelGraph, Validated};
pub use node::{Node, Weight};
pub use op::{Activation, Arity, Op, Padding};
pub use summary::render_summary;
