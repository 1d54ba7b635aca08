// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the export pipelines.

/// Errors that can occur while exporting or fixing models.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Building a zoo model failed.
    #[error("zoo error: {0}")]
    Zoo(#[from] model_zoo::ZooError),

    /// A graph rewrite failed.
    #[error("patch error: {0}")]
    Patch(#[from] graph_patcher::PatchError),

    /// Saving or reloading failed.
    #[error("store error: {0}")]
    Store(#[from] model_store::StoreError),

    /// A worker task died before reporting.
    #[error("export task failed: {0}")]
    Task(String),
}
