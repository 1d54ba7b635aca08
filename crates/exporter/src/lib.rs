// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # exporter
//!
//! The pipelines behind `zoo-export`:
//!
//! - [`download_all`] — build and save many zoo models in parallel.
//! - [`fix_efficientnet`] / [`fix_all`] — remove fixed dropout, make the
//!   squeeze-excite broadcast explicit, save as `"{name}Fixed"`.
//! - [`patch_stored`] — an arbitrary rewrite of a stored model.
//!
//! All of them are configured by an [`ExportConfig`].

mod config;
mod download;
mod error;
mod fix;
mod patch;

pub use config::{ExportConfig, MAX_JOBS};
pub use download::{download_all, export_model, ExportOutcome};
pub use error::ExportError;
pub use fix::{fix_all, fix_efficientnet, fix_graph, FIXED_SUFFIX};
pub use patch::{patch_stored, FactoryKind, PatchRequest};
