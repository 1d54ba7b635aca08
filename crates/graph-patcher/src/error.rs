// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph rewriting.

use layer_graph::GraphError;

/// Errors that can occur while rewriting a graph.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The rewrite was configured with an unusable option (unknown
    /// position, a position the matched node cannot support).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A node's predecessor has no recorded output. The graph is not in
    /// topological order or is missing its input.
    #[error("node '{node}' consumes '{input}', but no output has been computed for it")]
    MissingOutput { node: String, input: String },

    /// The name pattern is not a valid regular expression.
    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Building the rewritten graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
