// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph construction and validation.

/// Errors that can occur when building or validating a layer graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A node definition is invalid (bad arity, shapes that cannot be
    /// inferred, weights that disagree with the op).
    #[error("invalid layer '{layer}': {detail}")]
    InvalidLayer { layer: String, detail: String },

    /// A node refers to an input that is not defined before it.
    #[error("node '{node}' consumes '{input}', which is not defined before it")]
    UnknownInput { node: String, input: String },

    /// Two nodes share the same name.
    #[error("duplicate node name '{0}'")]
    DuplicateName(String),

    /// The graph as a whole is malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}

impl GraphError {
    pub(crate) fn layer(layer: &str, detail: impl Into<String>) -> Self {
        GraphError::InvalidLayer {
            layer: layer.to_string(),
            detail: detail.into(),
        }
    }
}
