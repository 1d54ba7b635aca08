// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-store
//!
//! Persists [`layer_graph::ModelGraph`]s as a single SafeTensors file
//! (weights as tensors, architecture in the header metadata) and writes
//! their text summaries.
//!
//! - [`StoreConfig`] — output directories, loadable from TOML.
//! - [`ModelStore`] — save, load and persist-and-reload.
//! - [`Architecture`] — the JSON manifest embedded in every file.

mod config;
mod error;
pub mod manifest;
mod store;

pub use config::{StoreConfig, MODEL_EXTENSION};
pub use error::StoreError;
pub use manifest::Architecture;
pub use store::{decode, read_architecture, read_graph, write_graph, ModelStore, SavedModel};
