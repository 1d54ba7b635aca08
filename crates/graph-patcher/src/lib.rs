// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-patcher
//!
//! Rewrites a [`layer_graph::ModelGraph`] by matching node names against a
//! regular expression and splicing in nodes built by a [`LayerFactory`].
//!
//! - [`Patcher`] — the rewrite, configured with an [`InsertPosition`] and a
//!   [`RenameStrategy`].
//! - [`factory`] — the [`LayerFactory`] trait and stock factories.
//! - [`presets`] — the EfficientNet fixes (fixed dropout, SE broadcast).
//!
//! The rewrite is pure: it reads the source graph and returns a new,
//! validated graph. Untouched weights are shared, not copied.

mod error;
pub mod factory;
mod position;
pub mod presets;
mod rewrite;

pub use error::PatchError;
pub use factory::{
    BroadcastFactory, DropoutFactory, IdentityFactory, LayerFactory, Replacement, ShapeHint,
};
pub use position::{InsertPosition, RenameStrategy};
pub use rewrite::{rewrite, Patcher};
