// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{LayerFactory, Replacement, ShapeHint};
use crate::PatchError;
use layer_graph::Op;

/// Plain dropout at a fixed rate, always named `"dropout"`.
///
/// Used to swap layers with a fixed noise shape for a standard dropout
/// that importers understand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropoutFactory {
    rate: f32,
}

impl DropoutFactory {
    /// Fails unless `rate` is in `[0, 1)`.
    pub fn new(rate: f32) -> Result<Self, PatchError> {
        if !(0.0..1.0).contains(&rate) {
            return Err(PatchError::Configuration(format!(
                "dropout rate must be in [0, 1), got {rate}"
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl LayerFactory for DropoutFactory {
    fn base_name(&self, _hint: Option<ShapeHint>) -> String {
        String::from("dropout")
    }

    fn build(&self, _name: &str, _hint: Option<ShapeHint>) -> Replacement {
        Replacement::new("dropout", Op::dropout(self.rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_proposed_name() {
        let r = DropoutFactory::new(0.2).unwrap().build("dropout_3", None);
        assert_eq!(r.name, "dropout");
        assert_eq!(r.op, Op::dropout(0.2));
        assert!(r.weights.is_empty());
    }

    #[test]
    fn test_rate_out_of_range() {
        assert!(DropoutFactory::new(0.0).is_ok());
        for rate in [1.0, 5.0, -1.0, f32::NAN] {
            assert!(matches!(
                DropoutFactory::new(rate),
                Err(PatchError::Configuration(_))
            ));
        }
    }
}
