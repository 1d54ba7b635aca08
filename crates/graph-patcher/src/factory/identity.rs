// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{LayerFactory, Replacement, ShapeHint};
use layer_graph::Op;

/// Identity layer with a fixed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFactory {
    pub name: String,
}

impl IdentityFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LayerFactory for IdentityFactory {
    fn base_name(&self, _hint: Option<ShapeHint>) -> String {
        self.name.clone()
    }

    fn build(&self, _name: &str, _hint: Option<ShapeHint>) -> Replacement {
        Replacement::new(self.name.clone(), Op::identity())
    }
}
