// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the model zoo.

/// Errors that can occur while building zoo models.
#[derive(Debug, thiserror::Error)]
pub enum ZooError {
    /// No architecture is registered under this name.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// The build options cannot produce a valid graph.
    #[error("invalid options for {model}: {detail}")]
    InvalidOptions { model: String, detail: String },

    /// Graph construction failed.
    #[error("graph error: {0}")]
    Graph(#[from] layer_graph::GraphError),
}
