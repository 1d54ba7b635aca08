// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph nodes.
//!
//! A [`Node`] is one layer: its op, the names of the nodes it consumes (in
//! order), its inferred output shape and its weights. Nodes refer to their
//! predecessors by name, so a node list can be stored, reloaded and rebuilt
//! without pointer fix-ups.

use crate::Op;
use tensor_core::{Shape, Tensor};

/// A named weight tensor belonging to a node (e.g., `"kernel"`, `"gamma"`).
#[derive(Debug, Clone, PartialEq)]
pub struct Weight {
    pub name: String,
    pub tensor: Tensor,
}

impl Weight {
    pub fn new(name: impl Into<String>, tensor: Tensor) -> Self {
        Self {
            name: name.into(),
            tensor,
        }
    }
}

/// A single layer in the model graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for this node (e.g., `"block2a_se_expand"`).
    pub name: String,
    /// The transform this node applies.
    pub op: Op,
    /// Names of the nodes this one consumes, in argument order.
    pub inputs: Vec<String>,
    /// Shape of the node's output activation (batch dimension first).
    pub output_shape: Shape,
    /// Weight tensors in the order [`Op::weight_shapes`] declares them.
    pub weights: Vec<Weight>,
}

impl Node {
    /// Returns the layer class name.
    pub fn class_name(&self) -> &'static str {
        self.op.class_name()
    }

    /// Returns `true` if this is the graph input.
    pub fn is_input(&self) -> bool {
        matches!(self.op, Op::Input { .. })
    }

    /// Looks up a weight by name.
    pub fn weight(&self, name: &str) -> Option<&Weight> {
        self.weights.iter().find(|w| w.name == name)
    }

    /// Total number of scalar parameters held by this node.
    pub fn param_count(&self) -> usize {
        self.weights.iter().map(|w| w.tensor.num_elements()).sum()
    }

    /// Number of parameters that training would update.
    pub fn trainable_param_count(&self) -> usize {
        self.weights
            .iter()
            .filter(|w| self.op.is_trainable_weight(&w.name))
            .map(|w| w.tensor.num_elements())
            .sum()
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        let inputs = if self.inputs.is_empty() {
            String::from("-")
        } else {
            self.inputs.join(", ")
        };
        format!(
            "{} ({}) {} <- {} [{} params]",
            self.name,
            self.class_name(),
            self.output_shape,
            inputs,
            self.param_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activation;

    fn dense_node() -> Node {
        Node {
            name: "fc1".into(),
            op: Op::Dense {
                units: 4,
                use_bias: true,
                activation: Activation::Relu,
            },
            inputs: vec!["flatten".into()],
            output_shape: Shape::matrix(1, 4),
            weights: vec![
                Weight::new("kernel", Tensor::filled_f32(Shape::matrix(8, 4), 0.1)),
                Weight::new("bias", Tensor::filled_f32(Shape::vector(4), 0.0)),
            ],
        }
    }

    #[test]
    fn test_param_count() {
        assert_eq!(dense_node().param_count(), 8 * 4 + 4);
    }

    #[test]
    fn test_weight_lookup() {
        let node = dense_node();
        assert!(node.weight("bias").is_some());
        assert!(node.weight("gamma").is_none());
    }

    #[test]
    fn test_summary() {
        let s = dense_node().summary();
        assert!(s.contains("fc1 (Dense)"));
        assert!(s.contains("<- flatten"));
        assert!(s.contains("36 params"));
    }
}
