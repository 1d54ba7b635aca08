// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-zoo
//!
//! Builds reference image-classification architectures as validated
//! [`layer_graph::ModelGraph`]s, with the layer names of the original
//! models and deterministic weights.
//!
//! # Example
//! ```
//! use model_zoo::{ZooModel, ZooOptions};
//!
//! let options = ZooOptions { input_size: Some(32), include_top: false, classes: 10 };
//! let graph = ZooModel::EfficientNetB0.build(&options).unwrap();
//! assert!(graph.node("block2b_drop").is_some());
//! ```

pub mod efficientnet;
mod error;
pub mod init;
mod layers;
mod registry;
mod resnet;
mod vgg;

pub use error::ZooError;
pub use registry::{Family, ZooModel, ZooOptions, MIN_INPUT_SIZE};
