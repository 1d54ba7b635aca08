// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Persisting patched-looking graphs and reading them back.

use layer_graph::{Activation, GraphBuilder, Loaded, ModelGraph, Node, Op, Padding, Validated};
use model_store::{read_graph, write_graph, ModelStore, StoreConfig, StoreError};
use safetensors::tensor::{serialize_to_file, TensorView};
use safetensors::{Dtype, SafeTensors};
use tempfile::TempDir;
use tensor_core::{DType, Shape, Tensor};

/// An SE block with a declared-shape identity and a fixed dropout.
fn se_graph() -> ModelGraph<Validated> {
    let zeros = |_: &str, _: &str, s: &Shape| Tensor::zeros(s.clone(), DType::F32);
    let mut b = GraphBuilder::new("se");
    let x = b.input("input_1", Shape::nhwc(1, 7, 7, 8)).unwrap();
    let sq = b.add("se_squeeze", Op::GlobalAveragePooling2D, &[x]).unwrap();
    let rs = b
        .add(
            "se_reshape",
            Op::Reshape {
                target_shape: vec![1, 1, 8],
            },
            &[sq],
        )
        .unwrap();
    let exp = b
        .add_initialized(
            "se_expand",
            Op::Conv2D {
                filters: 8,
                kernel_size: [1, 1],
                strides: [1, 1],
                padding: Padding::Same,
                use_bias: true,
                activation: Activation::Sigmoid,
            },
            &[rs],
            zeros,
        )
        .unwrap();
    let bc = b
        .add(
            "broadcast_w7_d8_1",
            Op::Lambda {
                output_shape: Some(vec![7, 7, 8]),
            },
            &[exp],
        )
        .unwrap();
    let excite = b.add("se_excite", Op::Multiply, &[x, bc]).unwrap();
    let drop = b
        .add(
            "drop",
            Op::Dropout {
                rate: 0.2,
                noise_shape: Some(vec![None, Some(1), Some(1), Some(1)]),
            },
            &[excite],
        )
        .unwrap();
    b.finish(drop).unwrap()
}

#[test]
fn test_round_trip_preserves_structure() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(StoreConfig::under(dir.path()));
    let graph = se_graph();
    let back = store.round_trip(&graph).unwrap();

    assert_eq!(back.nodes(), graph.nodes());
    assert_eq!(back.node("drop").unwrap().class_name(), "FixedDropout");
    assert_eq!(
        back.node("broadcast_w7_d8_1").unwrap().output_shape,
        Shape::nhwc(1, 7, 7, 8)
    );
}

#[test]
fn test_saved_model_loads_by_path() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(StoreConfig::under(dir.path()));
    let graph = se_graph();
    let path = store.save(&graph).unwrap();
    let back = store.load(&path).unwrap();
    assert_eq!(back.total_params(), graph.total_params());
}

#[test]
fn test_garbage_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("junk.safetensors");
    std::fs::write(&path, b"definitely not a model").unwrap();
    let store = ModelStore::default();
    assert!(matches!(
        store.load(&path),
        Err(StoreError::SafeTensors(_))
    ));
}

/// `input_1 -> layer`, written without validation.
fn unchecked(op: Op, output_shape: Shape) -> ModelGraph<Loaded> {
    let input = Node {
        name: "input_1".into(),
        op: Op::Input {
            batch_input_shape: Shape::matrix(1, 12),
        },
        inputs: Vec::new(),
        output_shape: Shape::matrix(1, 12),
        weights: Vec::new(),
    };
    let layer = Node {
        name: "layer".into(),
        op,
        inputs: vec!["input_1".into()],
        output_shape,
        weights: Vec::new(),
    };
    ModelGraph::new("unchecked".into(), vec![input, layer])
}

#[test]
fn test_overflowing_reshape_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reshape.safetensors");
    let op = Op::Reshape {
        target_shape: vec![usize::MAX, 3],
    };
    write_graph(&unchecked(op, Shape::matrix(1, 12)), &path).unwrap();

    let err = read_graph(&path).unwrap_err();
    assert!(matches!(err, StoreError::Graph(_)), "{err}");
}

#[test]
fn test_out_of_range_dropout_fails_to_load() {
    let dir = TempDir::new().unwrap();
    for rate in [5.0, -1.0, 1.0] {
        let path = dir.path().join(format!("dropout_{rate}.safetensors"));
        write_graph(&unchecked(Op::dropout(rate), Shape::matrix(1, 12)), &path).unwrap();
        let err = read_graph(&path).unwrap_err();
        assert!(err.to_string().contains("dropout rate"), "{rate}: {err}");
    }
}

#[test]
fn test_unreferenced_tensors_are_ignored() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(StoreConfig::under(dir.path()));
    let graph = se_graph();
    let path = store.save(&graph).unwrap();

    // Re-serialize with one tensor no layer declares.
    let bytes = std::fs::read(&path).unwrap();
    let (_, header) = SafeTensors::read_metadata(&bytes).unwrap();
    let meta = header.metadata().clone().unwrap();
    let stored = SafeTensors::deserialize(&bytes).unwrap();
    let orphan = vec![0u8; 16];
    let mut views: Vec<(String, TensorView<'_>)> = stored.tensors();
    views.push((
        "orphan/kernel".to_string(),
        TensorView::new(Dtype::F32, vec![2, 2], &orphan).unwrap(),
    ));
    let padded = dir.path().join("padded.safetensors");
    serialize_to_file(views, Some(meta), &padded).unwrap();
    assert_eq!(
        SafeTensors::deserialize(&std::fs::read(&padded).unwrap()).unwrap().len(),
        stored.len() + 1
    );

    let back = read_graph(&padded).unwrap();
    assert_eq!(back.nodes(), graph.nodes());
    assert_eq!(back.total_params(), graph.total_params());
}
