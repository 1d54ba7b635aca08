// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Incremental graph construction.
//!
//! [`GraphBuilder`] is how new graphs come into being: every node is added
//! by *applying* its op to references of nodes already in the builder, so
//! the output shape is inferred on the spot and the node list is
//! topologically ordered by construction. [`GraphBuilder::finish`] prunes
//! everything that does not reach the chosen output.

use crate::{GraphError, ModelGraph, Node, Op, Validated, Weight};
use std::collections::{HashMap, HashSet};
use tensor_core::{Shape, Tensor};

/// Reference to a node added to a [`GraphBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

/// Builds a [`ModelGraph<Validated>`] one node at a time.
#[derive(Debug)]
pub struct GraphBuilder {
    name: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Starts an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds the graph input. Must be the first node added.
    pub fn input(&mut self, name: &str, shape: Shape) -> Result<NodeRef, GraphError> {
        if !self.nodes.is_empty() {
            return Err(GraphError::layer(
                name,
                "the input must be the first node of a graph",
            ));
        }
        self.push(
            name,
            Op::Input {
                batch_input_shape: shape,
            },
            &[],
            Vec::new(),
        )
    }

    /// Applies a weightless op to `inputs`.
    pub fn add(&mut self, name: &str, op: Op, inputs: &[NodeRef]) -> Result<NodeRef, GraphError> {
        self.add_with_weights(name, op, inputs, Vec::new())
    }

    /// Applies an op to `inputs` with the given weights.
    ///
    /// Weights must match [`Op::weight_shapes`] exactly, in order.
    pub fn add_with_weights(
        &mut self,
        name: &str,
        op: Op,
        inputs: &[NodeRef],
        weights: Vec<Weight>,
    ) -> Result<NodeRef, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::layer(name, "add the graph input first"));
        }
        self.push(name, op, inputs, weights)
    }

    /// Applies an op to `inputs`, creating each declared weight with `init`.
    ///
    /// `init` receives the node name, the weight name and the weight shape.
    pub fn add_initialized<F>(
        &mut self,
        name: &str,
        op: Op,
        inputs: &[NodeRef],
        mut init: F,
    ) -> Result<NodeRef, GraphError>
    where
        F: FnMut(&str, &str, &Shape) -> Tensor,
    {
        let input_shapes = self.input_shapes(name, inputs)?;
        let weights = op
            .weight_shapes(name, &input_shapes)?
            .into_iter()
            .map(|(wname, shape)| Weight::new(wname, init(name, wname, &shape)))
            .collect();
        self.add_with_weights(name, op, inputs, weights)
    }

    /// Returns the output shape of a node already in the builder.
    pub fn shape(&self, node: NodeRef) -> &Shape {
        &self.nodes[node.0].output_shape
    }

    /// Returns a node already in the builder.
    pub fn node(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0]
    }

    /// Returns `true` if no node is called `name` yet.
    pub fn is_free(&self, name: &str) -> bool {
        !self.index.contains_key(name)
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Completes the graph with `output` as its output.
    ///
    /// Nodes that `output` does not depend on are dropped.
    pub fn finish(self, output: NodeRef) -> Result<ModelGraph<Validated>, GraphError> {
        if output.0 >= self.nodes.len() {
            return Err(GraphError::InvalidGraph(format!(
                "output reference {} is outside the graph",
                output.0
            )));
        }

        let mut live: HashSet<usize> = HashSet::new();
        let mut stack = vec![output.0];
        while let Some(i) = stack.pop() {
            if live.insert(i) {
                stack.extend(self.nodes[i].inputs.iter().map(|name| self.index[name]));
            }
        }

        let total = self.nodes.len();
        let nodes: Vec<Node> = self
            .nodes
            .into_iter()
            .enumerate()
            .take(output.0 + 1)
            .filter(|(i, _)| live.contains(i))
            .map(|(_, n)| n)
            .collect();
        if nodes.len() < total {
            tracing::debug!(
                "graph '{}': pruned {} node(s) that do not reach the output",
                self.name,
                total - nodes.len(),
            );
        }

        ModelGraph::new(self.name, nodes).validate()
    }

    fn input_shapes(&self, name: &str, inputs: &[NodeRef]) -> Result<Vec<&Shape>, GraphError> {
        inputs
            .iter()
            .map(|r| {
                self.nodes
                    .get(r.0)
                    .map(|n| &n.output_shape)
                    .ok_or_else(|| GraphError::layer(name, "input reference is outside the graph"))
            })
            .collect()
    }

    fn push(
        &mut self,
        name: &str,
        op: Op,
        inputs: &[NodeRef],
        weights: Vec<Weight>,
    ) -> Result<NodeRef, GraphError> {
        if !self.is_free(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        let input_shapes = self.input_shapes(name, inputs)?;
        let output_shape = op.output_shape(name, &input_shapes)?;

        let node = Node {
            name: name.to_string(),
            inputs: inputs.iter().map(|r| self.nodes[r.0].name.clone()).collect(),
            op,
            output_shape,
            weights,
        };
        // Weight shapes depend on the input shapes, so check them here rather
        // than waiting for `finish`.
        let expected = node.op.weight_shapes(name, &input_shapes)?;
        let matches = expected.len() == node.weights.len()
            && expected
                .iter()
                .zip(&node.weights)
                .all(|((wname, shape), w)| w.name == *wname && w.tensor.shape() == shape);
        if !matches {
            return Err(GraphError::layer(
                name,
                format!(
                    "{} expects weights {:?}",
                    node.class_name(),
                    expected
                        .iter()
                        .map(|(n, s)| format!("{n} {s}"))
                        .collect::<Vec<_>>()
                ),
            ));
        }

        let r = NodeRef(self.nodes.len());
        self.index.insert(node.name.clone(), r.0);
        self.nodes.push(node);
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Padding};

    fn conv(filters: usize) -> Op {
        Op::Conv2D {
            filters,
            kernel_size: [3, 3],
            strides: [1, 1],
            padding: Padding::Same,
            use_bias: true,
            activation: Activation::Relu,
        }
    }

    fn zeros(_: &str, _: &str, shape: &Shape) -> Tensor {
        Tensor::zeros(shape.clone(), tensor_core::DType::F32)
    }

    #[test]
    fn test_build_chain() {
        let mut b = GraphBuilder::new("tiny");
        let x = b.input("input_1", Shape::nhwc(1, 8, 8, 3)).unwrap();
        let c = b.add_initialized("conv", conv(4), &[x], zeros).unwrap();
        assert_eq!(b.shape(c), &Shape::nhwc(1, 8, 8, 4));
        let g = b.add("gap", Op::GlobalAveragePooling2D, &[c]).unwrap();
        let graph = b.finish(g).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.output().output_shape, Shape::matrix(1, 4));
        assert_eq!(graph.total_params(), 3 * 3 * 3 * 4 + 4);
    }

    #[test]
    fn test_input_must_come_first() {
        let mut b = GraphBuilder::new("x");
        assert!(b.add("a", Op::Flatten, &[]).is_err());
        b.input("in", Shape::matrix(1, 4)).unwrap();
        assert!(b.input("in2", Shape::matrix(1, 4)).is_err());
    }

    #[test]
    fn test_missing_weights_rejected() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::nhwc(1, 4, 4, 3)).unwrap();
        assert!(b.add("conv", conv(2), &[x]).is_err());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::matrix(1, 4)).unwrap();
        b.add("id", Op::identity(), &[x]).unwrap();
        assert!(matches!(
            b.add("id", Op::identity(), &[x]),
            Err(GraphError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_is_free() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::matrix(1, 4)).unwrap();
        assert!(b.is_free("id"));
        b.add("id", Op::identity(), &[x]).unwrap();
        assert!(!b.is_free("id"));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_finish_prunes_dead_branch() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::matrix(1, 4)).unwrap();
        let _dead = b.add("dead", Op::identity(), &[x]).unwrap();
        let live = b.add("live", Op::identity(), &[x]).unwrap();
        let graph = b.finish(live).unwrap();
        let names: Vec<_> = graph.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["in", "live"]);
    }

    #[test]
    fn test_finish_cuts_after_output() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::matrix(1, 4)).unwrap();
        let a = b.add("a", Op::identity(), &[x]).unwrap();
        b.add("after", Op::identity(), &[a]).unwrap();
        let graph = b.finish(a).unwrap();
        assert_eq!(graph.output().name, "a");
    }

    #[test]
    fn test_merge_records_input_order() {
        let mut b = GraphBuilder::new("x");
        let x = b.input("in", Shape::nhwc(1, 4, 4, 8)).unwrap();
        let g = b.add("gap", Op::GlobalAveragePooling2D, &[x]).unwrap();
        let r = b
            .add("rs", Op::Reshape { target_shape: vec![1, 1, 8] }, &[g])
            .unwrap();
        let m = b.add("mul", Op::Multiply, &[x, r]).unwrap();
        assert_eq!(b.node(m).inputs, vec!["in", "rs"]);
        assert_eq!(b.shape(m), &Shape::nhwc(1, 4, 4, 8));
    }
}
