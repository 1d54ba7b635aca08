// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The graph rewrite.
//!
//! [`Patcher::rewrite`] walks a graph in stored (topological) order and
//! re-applies every node to a fresh [`GraphBuilder`]. Nodes whose name
//! matches the pattern get a factory-built node spliced in according to the
//! [`InsertPosition`]. The input graph is only read.
//!
//! Per-rewrite state:
//! - `inputs_of`: node name → ordered predecessor names;
//! - `output_of`: original node name → reference to the node in the new
//!   graph that now stands for its output;
//! - `proposals`: base name → how many times the factory proposed it.

use crate::factory::{LayerFactory, ShapeHint};
use crate::{InsertPosition, PatchError, RenameStrategy};
use layer_graph::{GraphBuilder, GraphError, GraphState, ModelGraph, Node, NodeRef, Validated};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Rewrites graphs by splicing factory-built nodes at name matches.
///
/// # Example
/// ```
/// use graph_patcher::{IdentityFactory, InsertPosition, Patcher, RenameStrategy};
/// use layer_graph::{GraphBuilder, Op};
/// use tensor_core::Shape;
///
/// let mut b = GraphBuilder::new("chain");
/// let x = b.input("input", Shape::matrix(1, 4)).unwrap();
/// let a = b.add("A", Op::identity(), &[x]).unwrap();
/// let bb = b.add("B", Op::identity(), &[a]).unwrap();
/// let c = b.add("C", Op::identity(), &[bb]).unwrap();
/// let graph = b.finish(c).unwrap();
///
/// let patched = Patcher::new("B", IdentityFactory::new("id"))
///     .unwrap()
///     .position(InsertPosition::After)
///     .rename(RenameStrategy::Verbatim)
///     .rewrite(&graph)
///     .unwrap();
/// let names: Vec<_> = patched.iter_nodes().map(|n| n.name.as_str()).collect();
/// assert_eq!(names, ["input", "A", "B", "id", "C"]);
/// ```
#[derive(Debug)]
pub struct Patcher<F> {
    pattern: Regex,
    factory: F,
    position: InsertPosition,
    rename: RenameStrategy,
}

impl<F: LayerFactory> Patcher<F> {
    /// Creates a patcher. `pattern` matches from the start of a node name.
    ///
    /// Defaults: [`InsertPosition::After`], [`RenameStrategy::Prefix`].
    pub fn new(pattern: &str, factory: F) -> Result<Self, PatchError> {
        let pattern = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self {
            pattern,
            factory,
            position: InsertPosition::default(),
            rename: RenameStrategy::default(),
        })
    }

    /// Sets where the new node goes.
    pub fn position(mut self, position: InsertPosition) -> Self {
        self.position = position;
        self
    }

    /// Sets how the new node is named.
    pub fn rename(mut self, rename: RenameStrategy) -> Self {
        self.rename = rename;
        self
    }

    /// Returns `true` if `name` would be patched.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Produces a new graph with every matching node patched.
    ///
    /// Works on graphs in either state. A graph whose order is broken
    /// fails with [`PatchError::MissingOutput`] at the first node whose
    /// predecessor has not been produced yet.
    pub fn rewrite<S: GraphState>(
        &self,
        graph: &ModelGraph<S>,
    ) -> Result<ModelGraph<Validated>, PatchError> {
        let nodes = graph.nodes();
        let input = match nodes.first() {
            Some(node) if node.is_input() => node,
            _ => {
                return Err(GraphError::InvalidGraph(format!(
                    "'{}' does not start with an input layer",
                    graph.name
                ))
                .into())
            }
        };

        let inputs_of: HashMap<&str, &[String]> = nodes
            .iter()
            .map(|n| (n.name.as_str(), n.inputs.as_slice()))
            .collect();
        let reserved: HashSet<&str> = inputs_of.keys().copied().collect();

        let mut builder = GraphBuilder::new(graph.name.clone());
        let mut output_of: HashMap<&str, NodeRef> = HashMap::with_capacity(nodes.len());
        let mut proposals: HashMap<String, usize> = HashMap::new();

        let mut last = builder.input(&input.name, input.output_shape.clone())?;
        output_of.insert(&input.name, last);
        let mut patched = 0usize;

        for (i, node) in nodes.iter().enumerate().skip(1) {
            let resolved = inputs_of[node.name.as_str()]
                .iter()
                .map(|name| {
                    output_of
                        .get(name.as_str())
                        .copied()
                        .ok_or_else(|| PatchError::MissingOutput {
                            node: node.name.clone(),
                            input: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let out = if self.pattern.is_match(&node.name) {
                patched += 1;
                let hint = nodes
                    .get(i + 1)
                    .and_then(|next| ShapeHint::from_shape(&next.output_shape));
                self.splice(&mut builder, &reserved, &mut proposals, node, &resolved, hint)?
            } else {
                reapply(&mut builder, node, &resolved)?
            };

            output_of.insert(&node.name, out);
            last = out;
        }

        tracing::info!(
            "rewrote '{}': {} of {} node(s) matched '{}' ({})",
            graph.name,
            patched,
            nodes.len(),
            self.pattern.as_str(),
            self.position,
        );
        Ok(builder.finish(last)?)
    }

    fn splice(
        &self,
        builder: &mut GraphBuilder,
        reserved: &HashSet<&str>,
        proposals: &mut HashMap<String, usize>,
        node: &Node,
        resolved: &[NodeRef],
        hint: Option<ShapeHint>,
    ) -> Result<NodeRef, PatchError> {
        let base = self.factory.base_name(hint);
        let count = proposals.entry(base.clone()).or_insert(0);
        *count += 1;
        let proposed = format!("{base}_{count}");

        let replacement = self.factory.build(&proposed, hint);
        let wanted = self.rename.apply(&node.name, &replacement.name);
        let name = free_name(builder, reserved, &wanted);
        tracing::debug!(
            "{} '{}' → '{}' ({})",
            self.position,
            node.name,
            name,
            replacement.op.class_name(),
        );

        match self.position {
            InsertPosition::Replace => Ok(builder.add_with_weights(
                &name,
                replacement.op,
                resolved,
                replacement.weights,
            )?),
            InsertPosition::After => {
                let own = reapply(builder, node, resolved)?;
                Ok(builder.add_with_weights(&name, replacement.op, &[own], replacement.weights)?)
            }
            InsertPosition::Before => {
                if resolved.len() != 1 {
                    return Err(PatchError::Configuration(format!(
                        "cannot insert before '{}': it has {} inputs",
                        node.name,
                        resolved.len()
                    )));
                }
                let inserted =
                    builder.add_with_weights(&name, replacement.op, resolved, replacement.weights)?;
                reapply(builder, node, &[inserted])
            }
        }
    }
}

/// Convenience wrapper: one rewrite with explicit options.
pub fn rewrite<S, F>(
    graph: &ModelGraph<S>,
    pattern: &str,
    factory: F,
    position: InsertPosition,
    rename: RenameStrategy,
) -> Result<ModelGraph<Validated>, PatchError>
where
    S: GraphState,
    F: LayerFactory,
{
    Patcher::new(pattern, factory)?
        .position(position)
        .rename(rename)
        .rewrite(graph)
}

/// Applies `node`'s own op and weights to new inputs, keeping its name.
fn reapply(
    builder: &mut GraphBuilder,
    node: &Node,
    inputs: &[NodeRef],
) -> Result<NodeRef, PatchError> {
    Ok(builder.add_with_weights(&node.name, node.op.clone(), inputs, node.weights.clone())?)
}

/// Returns `wanted`, or `wanted_2`, `wanted_3`, … if that name is taken by
/// a node already built or by any node of the source graph.
fn free_name(builder: &GraphBuilder, reserved: &HashSet<&str>, wanted: &str) -> String {
    let free = |name: &str| builder.is_free(name) && !reserved.contains(name);
    if free(wanted) {
        return wanted.to_string();
    }
    (2..)
        .map(|n| format!("{wanted}_{n}"))
        .find(|candidate| free(candidate))
        .unwrap_or_else(|| wanted.to_string())
}
