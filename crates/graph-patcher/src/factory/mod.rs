// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`LayerFactory`] trait and the stock factories.

mod broadcast;
mod dropout;
mod identity;

pub use broadcast::BroadcastFactory;
pub use dropout::DropoutFactory;
pub use identity::IdentityFactory;

use layer_graph::{Op, Weight};
use tensor_core::Shape;

/// Spatial context taken from the node after a match.
///
/// Assumes a channel-last activation: `width` is dimension 1 and `depth`
/// dimension 3 of the following node's output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeHint {
    pub width: usize,
    pub depth: usize,
}

impl ShapeHint {
    /// Reads a hint from a `[batch, height, width, channels]` shape.
    ///
    /// Returns `None` for shapes of rank below 4.
    pub fn from_shape(shape: &Shape) -> Option<Self> {
        if shape.rank() < 4 {
            return None;
        }
        Some(Self {
            width: shape.dim(1)?,
            depth: shape.dim(3)?,
        })
    }

    /// The square `(width, width, depth)` activation this hint describes.
    pub fn hwc(self) -> [usize; 3] {
        [self.width, self.width, self.depth]
    }
}

/// A node produced by a factory, not yet wired into a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub name: String,
    pub op: Op,
    pub weights: Vec<Weight>,
}

impl Replacement {
    /// A weightless replacement.
    pub fn new(name: impl Into<String>, op: Op) -> Self {
        Self {
            name: name.into(),
            op,
            weights: Vec::new(),
        }
    }
}

/// Builds the node that is spliced in at each match.
///
/// Factories are stateless: the patcher calls them once per match.
pub trait LayerFactory: Send + Sync {
    /// Base of the name proposed to [`LayerFactory::build`]. The patcher
    /// appends `_{n}`, counting uses of the same base within one rewrite.
    fn base_name(&self, _hint: Option<ShapeHint>) -> String {
        String::from("inserted")
    }

    /// Builds the replacement. `name` is the proposed, already
    /// de-duplicated name; factories may ignore it.
    fn build(&self, name: &str, hint: Option<ShapeHint>) -> Replacement;
}

impl<F> LayerFactory for F
where
    F: Fn(&str, Option<ShapeHint>) -> Replacement + Send + Sync,
{
    fn build(&self, name: &str, hint: Option<ShapeHint>) -> Replacement {
        self(name, hint)
    }
}
