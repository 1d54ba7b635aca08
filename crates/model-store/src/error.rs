// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model persistence.

use std::path::PathBuf;

/// Errors raised while saving or loading stored models.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The SafeTensors container could not be written or parsed.
    #[error("SafeTensors error: {0}")]
    SafeTensors(String),

    /// The file is a SafeTensors file but not one of ours.
    #[error("unsupported model file: {0}")]
    Format(String),

    /// The embedded architecture could not be (de)serialised.
    #[error("architecture manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A weight listed in the architecture has no tensor.
    #[error("weight '{weight}' of layer '{layer}' not found in file")]
    MissingWeight { layer: String, weight: String },

    /// A stored tensor disagrees with its descriptor.
    #[error("weight '{weight}' of layer '{layer}': {detail}")]
    WeightMismatch {
        layer: String,
        weight: String,
        detail: String,
    },

    /// The stored graph failed reconstruction or validation.
    #[error("graph error: {0}")]
    Graph(#[from] layer_graph::GraphError),

    /// Tensor data was malformed.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
