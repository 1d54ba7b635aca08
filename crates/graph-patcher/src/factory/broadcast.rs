// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{LayerFactory, Replacement, ShapeHint};
use layer_graph::Op;

/// Identity layer that declares the broadcast shape of the next node.
///
/// Placed after a squeeze-excite expansion (`(1, 1, C)`), it tells an
/// importer that cannot broadcast on its own that the activation is
/// `(W, W, C)`. Names follow `broadcast_w{W}_d{C}_{n}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastFactory;

impl LayerFactory for BroadcastFactory {
    fn base_name(&self, hint: Option<ShapeHint>) -> String {
        match hint {
            Some(h) => format!("broadcast_w{}_d{}", h.width, h.depth),
            None => String::from("broadcast"),
        }
    }

    fn build(&self, name: &str, hint: Option<ShapeHint>) -> Replacement {
        Replacement::new(
            name,
            Op::Lambda {
                output_shape: hint.map(|h| h.hwc().to_vec()),
            },
        )
    }
}
