// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: a DAG of layers stored in topological order.
//!
//! # Type-State Pattern
//!
//! ```text
//! ModelGraph<Loaded>     — nodes parsed, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  — order, arity, shapes and weights verified.
//! ```
//!
//! A validated graph guarantees:
//! - it is non-empty and its first node is the only `InputLayer`;
//! - node names are unique;
//! - every node's inputs name nodes stored *before* it (topological order);
//! - every stored output shape equals the shape its op infers;
//! - every node's weights match the op's declared weight shapes.
//!
//! The output of the graph is its last node.

use crate::{GraphError, Node};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tensor_core::Shape;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The complete model represented as a topologically ordered node list.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name (e.g., `"EfficientNetB0"`).
    pub name: String,
    nodes: Vec<Node>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state. Nothing is checked yet.
    pub fn new(name: String, nodes: Vec<Node>) -> Self {
        Self {
            name,
            nodes,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    pub fn validate(self) -> Result<ModelGraph<Validated>, GraphError> {
        let first = self.nodes.first().ok_or_else(|| {
            GraphError::InvalidGraph("model graph contains no nodes".into())
        })?;
        if !first.is_input() {
            return Err(GraphError::InvalidGraph(format!(
                "first node '{}' is a {}, expected an InputLayer",
                first.name,
                first.class_name()
            )));
        }

        let mut shapes: HashMap<&str, &Shape> = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 && node.is_input() {
                return Err(GraphError::layer(
                    &node.name,
                    "a graph has exactly one InputLayer",
                ));
            }
            if shapes.contains_key(node.name.as_str()) {
                return Err(GraphError::DuplicateName(node.name.clone()));
            }

            let mut input_shapes = Vec::with_capacity(node.inputs.len());
            for input in &node.inputs {
                let shape = shapes.get(input.as_str()).ok_or_else(|| GraphError::UnknownInput {
                    node: node.name.clone(),
                    input: input.clone(),
                })?;
                input_shapes.push(*shape);
            }

            let inferred = node.op.output_shape(&node.name, &input_shapes)?;
            if inferred != node.output_shape {
                return Err(GraphError::layer(
                    &node.name,
                    format!(
                        "stored output shape {} disagrees with inferred {inferred}",
                        node.output_shape
                    ),
                ));
            }
            check_weights(node, &input_shapes)?;

            shapes.insert(&node.name, &node.output_shape);
        }

        // Nodes nobody consumes (other than the output) are tolerated: the
        // builder prunes them, but a hand-assembled graph may carry them.
        let consumed: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.inputs.iter().map(String::as_str))
            .collect();
        let last = self.nodes.len() - 1;
        for node in &self.nodes[..last] {
            if !consumed.contains(node.name.as_str()) {
                tracing::warn!(
                    "node '{}' in '{}' has no consumers and does not reach the output",
                    node.name,
                    self.name,
                );
            }
        }

        Ok(ModelGraph {
            name: self.name,
            nodes: self.nodes,
            _state: std::marker::PhantomData,
        })
    }
}

fn check_weights(node: &Node, input_shapes: &[&Shape]) -> Result<(), GraphError> {
    let expected = node.op.weight_shapes(&node.name, input_shapes)?;
    if expected.len() != node.weights.len() {
        return Err(GraphError::layer(
            &node.name,
            format!(
                "{} expects {} weight tensor(s), found {}",
                node.class_name(),
                expected.len(),
                node.weights.len()
            ),
        ));
    }
    for ((name, shape), weight) in expected.iter().zip(&node.weights) {
        if weight.name != *name || weight.tensor.shape() != shape {
            return Err(GraphError::layer(
                &node.name,
                format!(
                    "weight '{}' {} does not match expected '{name}' {shape}",
                    weight.name,
                    weight.tensor.shape()
                ),
            ));
        }
    }
    Ok(())
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the graph's input node.
    pub fn input(&self) -> &Node {
        &self.nodes[0]
    }

    /// Returns the graph's output node.
    pub fn output(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Returns an iterator over the nodes in topological order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns a one-line summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} nodes, {} params, input {}, output {}",
            self.name,
            self.num_nodes(),
            self.total_params(),
            self.input().output_shape,
            self.output().output_shape,
        )
    }

    /// Drops the validation marker, e.g. to hand-edit nodes in tests.
    pub fn into_loaded(self) -> ModelGraph<Loaded> {
        ModelGraph::new(self.name, self.nodes)
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> ModelGraph<S> {
    /// Returns the nodes in stored order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Consumes the graph, returning its nodes.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Returns the total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Returns the stored position of a node.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Returns the consumers of every node, in stored order.
    ///
    /// This is the outbound view of the edges each node declares.
    pub fn consumers(&self) -> HashMap<&str, Vec<&str>> {
        let mut out: HashMap<&str, Vec<&str>> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            for input in &node.inputs {
                out.entry(input.as_str()).or_default().push(node.name.as_str());
            }
        }
        out
    }

    /// Total number of scalar parameters.
    pub fn total_params(&self) -> usize {
        self.nodes.iter().map(Node::param_count).sum()
    }

    /// Total number of trainable parameters.
    pub fn trainable_params(&self) -> usize {
        self.nodes.iter().map(Node::trainable_param_count).sum()
    }
}

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Op, Weight};
    use tensor_core::Tensor;

    fn input(name: &str, dims: &[usize]) -> Node {
        Node {
            name: name.into(),
            op: Op::Input {
                batch_input_shape: Shape::from(dims),
            },
            inputs: vec![],
            output_shape: Shape::from(dims),
            weights: vec![],
        }
    }

    fn relu(name: &str, input: &str, dims: &[usize]) -> Node {
        Node {
            name: name.into(),
            op: Op::Activation {
                activation: Activation::Relu,
            },
            inputs: vec![input.into()],
            output_shape: Shape::from(dims),
            weights: vec![],
        }
    }

    fn chain() -> Vec<Node> {
        vec![
            input("in", &[1, 8]),
            relu("a", "in", &[1, 8]),
            relu("b", "a", &[1, 8]),
        ]
    }

    #[test]
    fn test_validate_ok() {
        let graph = ModelGraph::new("chain".into(), chain()).validate().unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.input().name, "in");
        assert_eq!(graph.output().name, "b");
    }

    #[test]
    fn test_validate_empty() {
        let graph = ModelGraph::new("empty".into(), vec![]);
        assert!(matches!(graph.validate(), Err(GraphError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_first_not_input() {
        let mut nodes = chain();
        nodes.remove(0);
        assert!(ModelGraph::new("x".into(), nodes).validate().is_err());
    }

    #[test]
    fn test_validate_non_topological() {
        let mut nodes = chain();
        nodes.swap(1, 2);
        let err = ModelGraph::new("x".into(), nodes).validate().unwrap_err();
        assert!(matches!(err, GraphError::UnknownInput { ref node, ref input } if node == "b" && input == "a"));
    }

    #[test]
    fn test_validate_duplicate_name() {
        let mut nodes = chain();
        nodes[2].name = "a".into();
        assert!(matches!(
            ModelGraph::new("x".into(), nodes).validate(),
            Err(GraphError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_validate_second_input() {
        let mut nodes = chain();
        nodes.push(input("in2", &[1, 8]));
        assert!(ModelGraph::new("x".into(), nodes).validate().is_err());
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let mut nodes = chain();
        nodes[2].output_shape = Shape::matrix(1, 9);
        assert!(ModelGraph::new("x".into(), nodes).validate().is_err());
    }

    #[test]
    fn test_validate_missing_weights() {
        let mut nodes = chain();
        nodes.push(Node {
            name: "fc".into(),
            op: Op::Dense {
                units: 2,
                use_bias: false,
                activation: Activation::Linear,
            },
            inputs: vec!["b".into()],
            output_shape: Shape::matrix(1, 2),
            weights: vec![],
        });
        assert!(ModelGraph::new("x".into(), nodes.clone()).validate().is_err());

        nodes[3].weights = vec![Weight::new(
            "kernel",
            Tensor::filled_f32(Shape::matrix(8, 2), 0.5),
        )];
        let graph = ModelGraph::new("x".into(), nodes).validate().unwrap();
        assert_eq!(graph.total_params(), 16);
    }

    #[test]
    fn test_consumers() {
        let mut nodes = chain();
        nodes.push(Node {
            name: "sum".into(),
            op: Op::Add,
            inputs: vec!["a".into(), "b".into()],
            output_shape: Shape::matrix(1, 8),
            weights: vec![],
        });
        let graph = ModelGraph::new("x".into(), nodes).validate().unwrap();
        let consumers = graph.consumers();
        assert_eq!(consumers["a"], vec!["b", "sum"]);
        assert_eq!(consumers["b"], vec!["sum"]);
        assert!(!consumers.contains_key("sum"));
    }

    #[test]
    fn test_display_and_summary() {
        let graph = ModelGraph::new("chain".into(), chain()).validate().unwrap();
        let display = format!("{graph}");
        assert!(display.contains("a (Activation)"));
        let summary = graph.summary();
        assert!(summary.contains("chain"));
        assert!(summary.contains("3 nodes"));
    }

    #[test]
    fn test_position_lookup() {
        let graph = ModelGraph::new("chain".into(), chain());
        assert_eq!(graph.position("b"), Some(2));
        assert!(graph.node("zzz").is_none());
    }
}
