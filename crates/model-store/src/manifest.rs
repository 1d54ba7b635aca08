// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The architecture manifest embedded in stored models.
//!
//! # Format
//! ```json
//! {
//!   "name": "EfficientNetB0",
//!   "layers": [
//!     {
//!       "name": "input_1",
//!       "op": { "class_name": "InputLayer", "config": { "batch_input_shape": [1, 224, 224, 3] } },
//!       "inbound_nodes": [],
//!       "weights": []
//!     },
//!     {
//!       "name": "stem_conv",
//!       "op": { "class_name": "Conv2D", "config": { "filters": 32, ... } },
//!       "inbound_nodes": ["rescaling"],
//!       "weights": [{ "name": "kernel", "shape": [3, 3, 3, 32], "dtype": "f32" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Output shapes are not stored; they are re-inferred on load.

use layer_graph::{GraphState, ModelGraph, Op};
use tensor_core::{DType, Shape};

/// Top-level architecture description.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Architecture {
    pub name: String,
    pub layers: Vec<LayerEntry>,
}

/// One layer in stored order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerEntry {
    pub name: String,
    pub op: Op,
    #[serde(default)]
    pub inbound_nodes: Vec<String>,
    #[serde(default)]
    pub weights: Vec<WeightEntry>,
}

/// Descriptor of a weight tensor, keyed `"{layer}/{name}"` in the file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub shape: Shape,
    pub dtype: DType,
}

impl Architecture {
    /// Describes a graph.
    pub fn from_graph<S: GraphState>(graph: &ModelGraph<S>) -> Self {
        let layers = graph
            .nodes()
            .iter()
            .map(|node| LayerEntry {
                name: node.name.clone(),
                op: node.op.clone(),
                inbound_nodes: node.inputs.clone(),
                weights: node
                    .weights
                    .iter()
                    .map(|w| WeightEntry {
                        name: w.name.clone(),
                        shape: w.tensor.shape().clone(),
                        dtype: w.tensor.dtype(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            name: graph.name.clone(),
            layers,
        }
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialises to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Number of weight tensors across all layers.
    pub fn total_weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len()).sum()
    }
}

/// Key of a weight tensor inside the SafeTensors file.
pub fn tensor_key(layer: &str, weight: &str) -> String {
    format!("{layer}/{weight}")
}
