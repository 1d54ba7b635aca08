// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end rewrites over small hand-built graphs.

use graph_patcher::presets::{self, FIXED_DROPOUT_PATTERN, SE_EXPAND_PATTERN};
use graph_patcher::{rewrite, IdentityFactory, InsertPosition, PatchError, RenameStrategy};
use layer_graph::{Activation, GraphBuilder, ModelGraph, Op, Padding, Validated};
use tensor_core::{DType, Shape, Tensor};

fn names(graph: &ModelGraph<Validated>) -> Vec<&str> {
    graph.iter_nodes().map(|n| n.name.as_str()).collect()
}

fn ones(_: &str, _: &str, shape: &Shape) -> Tensor {
    Tensor::filled_f32(shape.clone(), 1.0)
}

/// `input → A → B → C`, all dense so every node carries weights.
fn dense_chain() -> ModelGraph<Validated> {
    let dense = |units| Op::Dense {
        units,
        use_bias: true,
        activation: Activation::Linear,
    };
    let mut b = GraphBuilder::new("chain");
    let x = b.input("input", Shape::matrix(1, 4)).unwrap();
    let a = b.add_initialized("A", dense(8), &[x], ones).unwrap();
    let bb = b.add_initialized("B", dense(8), &[a], ones).unwrap();
    let c = b.add_initialized("C", dense(2), &[bb], ones).unwrap();
    b.finish(c).unwrap()
}

fn conv1x1(filters: usize, activation: Activation) -> Op {
    Op::Conv2D {
        filters,
        kernel_size: [1, 1],
        strides: [1, 1],
        padding: Padding::Same,
        use_bias: true,
        activation,
    }
}

/// One EfficientNet-style block: squeeze-excite, then a fixed dropout
/// before the residual add.
fn se_block() -> ModelGraph<Validated> {
    let mut b = GraphBuilder::new("se_block");
    let zeros = |_: &str, _: &str, s: &Shape| Tensor::zeros(s.clone(), DType::F32);
    let x = b.input("input_1", Shape::nhwc(1, 14, 14, 16)).unwrap();
    let sq = b
        .add("block2b_se_squeeze", Op::GlobalAveragePooling2D, &[x])
        .unwrap();
    let rs = b
        .add(
            "block2b_se_reshape",
            Op::Reshape {
                target_shape: vec![1, 1, 16],
            },
            &[sq],
        )
        .unwrap();
    let red = b
        .add_initialized("block2b_se_reduce", conv1x1(4, Activation::Swish), &[rs], zeros)
        .unwrap();
    let exp = b
        .add_initialized("block2b_se_expand", conv1x1(16, Activation::Sigmoid), &[red], zeros)
        .unwrap();
    let excite = b.add("block2b_se_excite", Op::Multiply, &[x, exp]).unwrap();
    let drop = b
        .add(
            "block2b_drop",
            Op::Dropout {
                rate: 0.0125,
                noise_shape: Some(vec![None, Some(1), Some(1), Some(1)]),
            },
            &[excite],
        )
        .unwrap();
    let add = b.add("block2b_add", Op::Add, &[drop, x]).unwrap();
    b.finish(add).unwrap()
}

#[test]
fn test_after_inserts_between_match_and_consumer() {
    let graph = dense_chain();
    let out = rewrite(
        &graph,
        "B",
        IdentityFactory::new("id"),
        InsertPosition::After,
        RenameStrategy::Verbatim,
    )
    .unwrap();
    assert_eq!(names(&out), ["input", "A", "B", "id", "C"]);
    assert_eq!(out.node("id").unwrap().inputs, ["B"]);
    assert_eq!(out.node("C").unwrap().inputs, ["id"]);
    // B keeps its transform and weights.
    assert_eq!(out.node("B").unwrap(), graph.node("B").unwrap());
}

#[test]
fn test_replace_drops_matched_node() {
    let graph = dense_chain();
    let out = rewrite(
        &graph,
        "B",
        IdentityFactory::new("id"),
        InsertPosition::Replace,
        RenameStrategy::Verbatim,
    )
    .unwrap();
    assert_eq!(names(&out), ["input", "A", "id", "C"]);
    assert_eq!(out.node("id").unwrap().inputs, ["A"]);
    assert_eq!(out.node("C").unwrap().inputs, ["id"]);
    assert_eq!(out.total_params(), graph.total_params() - (8 * 8 + 8));
}

#[test]
fn test_no_match_is_structurally_identical() {
    let graph = dense_chain();
    let out = rewrite(
        &graph,
        "nothing_here",
        IdentityFactory::new("id"),
        InsertPosition::After,
        RenameStrategy::Prefix,
    )
    .unwrap();
    assert_eq!(out.nodes(), graph.nodes());
}

#[test]
fn test_untouched_weights_share_storage() {
    let graph = dense_chain();
    let out = rewrite(
        &graph,
        "B",
        IdentityFactory::new("id"),
        InsertPosition::After,
        RenameStrategy::Prefix,
    )
    .unwrap();
    let before = &graph.node("A").unwrap().weights[0].tensor;
    let after = &out.node("A").unwrap().weights[0].tensor;
    assert!(before.shares_buffer(after));
}

#[test]
fn test_repeated_names_get_suffixes() {
    let graph = dense_chain();
    let out = rewrite(
        &graph,
        "A|B",
        IdentityFactory::new("id"),
        InsertPosition::After,
        RenameStrategy::Verbatim,
    )
    .unwrap();
    assert_eq!(names(&out), ["input", "A", "id", "B", "id_2", "C"]);
}

#[test]
fn test_out_of_order_graph_reports_missing_output() {
    let graph = dense_chain();
    let mut nodes = graph.into_nodes();
    nodes.swap(1, 2);
    let broken = ModelGraph::new("broken".into(), nodes);

    let err = rewrite(
        &broken,
        "C",
        IdentityFactory::new("id"),
        InsertPosition::After,
        RenameStrategy::Prefix,
    )
    .unwrap_err();
    match err {
        PatchError::MissingOutput { node, input } => {
            assert_eq!(node, "B");
            assert_eq!(input, "A");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_remove_fixed_dropout_preset() {
    let graph = se_block();
    let patcher = presets::remove_fixed_dropout(FIXED_DROPOUT_PATTERN, 0.2).unwrap();
    let out = patcher.rewrite(&graph).unwrap();

    assert!(out.node("block2b_drop").is_none());
    let drop = out.node("block2b_drop_dropout").unwrap();
    assert_eq!(drop.op, Op::dropout(0.2));
    assert_eq!(drop.class_name(), "Dropout");
    assert_eq!(out.node("block2b_add").unwrap().inputs, ["block2b_drop_dropout", "input_1"]);
    assert!(out.iter_nodes().all(|n| n.class_name() != "FixedDropout"));
}

#[test]
fn test_fix_broadcast_preset() {
    let graph = se_block();
    let patcher = presets::fix_broadcast(SE_EXPAND_PATTERN).unwrap();
    let out = patcher.rewrite(&graph).unwrap();

    let inserted = out.node("broadcast_w14_d16_1").unwrap();
    assert_eq!(inserted.inputs, ["block2b_se_expand"]);
    assert_eq!(inserted.output_shape, Shape::nhwc(1, 14, 14, 16));
    assert_eq!(
        out.node("block2b_se_excite").unwrap().inputs,
        ["input_1", "broadcast_w14_d16_1"]
    );
    assert_eq!(out.num_nodes(), graph.num_nodes() + 1);
}

#[test]
fn test_presets_compose() {
    let graph = se_block();
    let once = presets::remove_fixed_dropout(FIXED_DROPOUT_PATTERN, 0.2)
        .unwrap()
        .rewrite(&graph)
        .unwrap();
    let twice = presets::fix_broadcast(SE_EXPAND_PATTERN)
        .unwrap()
        .rewrite(&once)
        .unwrap();
    assert_eq!(twice.total_params(), graph.total_params());
    assert_eq!(twice.output().output_shape, graph.output().output_shape);
}
