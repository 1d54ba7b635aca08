// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! ResNet50 / 101 / 152 (bottleneck blocks, v1).

use crate::layers::{activation, apply, batch_norm, conv, dense, max_pool, zero_pad};
use crate::{ZooError, ZooOptions};
use layer_graph::{Activation, GraphBuilder, ModelGraph, NodeRef, Op, Padding, Validated};
use tensor_core::Shape;

const BN_EPSILON: f32 = 1.001e-5;

/// Blocks per stage (`conv2` … `conv5`).
pub(crate) const RESNET50: [usize; 4] = [3, 4, 6, 3];
pub(crate) const RESNET101: [usize; 4] = [3, 4, 23, 3];
pub(crate) const RESNET152: [usize; 4] = [3, 8, 36, 3];

pub(crate) fn build(
    name: &str,
    stages: &[usize; 4],
    size: usize,
    options: &ZooOptions,
) -> Result<ModelGraph<Validated>, ZooError> {
    let relu = || activation(Activation::Relu);
    let mut b = GraphBuilder::new(name);
    let mut x = b.input("input_1", Shape::nhwc(1, size, size, 3))?;

    x = apply(&mut b, "conv1_pad", zero_pad(3), &[x])?;
    x = apply(
        &mut b,
        "conv1_conv",
        conv(64, 7, 2, Padding::Valid, true, Activation::Linear),
        &[x],
    )?;
    x = apply(&mut b, "conv1_bn", batch_norm(BN_EPSILON), &[x])?;
    x = apply(&mut b, "conv1_relu", relu(), &[x])?;
    x = apply(&mut b, "pool1_pad", zero_pad(1), &[x])?;
    x = apply(&mut b, "pool1_pool", max_pool(3, 2), &[x])?;

    for (stage, (&blocks, filters)) in stages.iter().zip([64, 128, 256, 512]).enumerate() {
        let stride = if stage == 0 { 1 } else { 2 };
        let prefix = format!("conv{}", stage + 2);
        x = bottleneck(&mut b, &format!("{prefix}_block1"), x, filters, stride, true)?;
        for i in 2..=blocks {
            x = bottleneck(&mut b, &format!("{prefix}_block{i}"), x, filters, 1, false)?;
        }
    }

    if options.include_top {
        x = apply(&mut b, "avg_pool", Op::GlobalAveragePooling2D, &[x])?;
        x = apply(
            &mut b,
            "predictions",
            dense(options.classes, Activation::Softmax),
            &[x],
        )?;
    }

    Ok(b.finish(x)?)
}

/// 1x1 → 3x3 → 1x1 with a residual add. The first block of a stage
/// projects the shortcut.
fn bottleneck(
    b: &mut GraphBuilder,
    name: &str,
    input: NodeRef,
    filters: usize,
    stride: usize,
    project: bool,
) -> Result<NodeRef, ZooError> {
    let linear = |f, k, s, p| conv(f, k, s, p, true, Activation::Linear);
    let relu = || activation(Activation::Relu);

    let shortcut = if project {
        let s = apply(b, &format!("{name}_0_conv"), linear(4 * filters, 1, stride, Padding::Valid), &[input])?;
        apply(b, &format!("{name}_0_bn"), batch_norm(BN_EPSILON), &[s])?
    } else {
        input
    };

    let mut x = apply(b, &format!("{name}_1_conv"), linear(filters, 1, stride, Padding::Valid), &[input])?;
    x = apply(b, &format!("{name}_1_bn"), batch_norm(BN_EPSILON), &[x])?;
    x = apply(b, &format!("{name}_1_relu"), relu(), &[x])?;
    x = apply(b, &format!("{name}_2_conv"), linear(filters, 3, 1, Padding::Same), &[x])?;
    x = apply(b, &format!("{name}_2_bn"), batch_norm(BN_EPSILON), &[x])?;
    x = apply(b, &format!("{name}_2_relu"), relu(), &[x])?;
    x = apply(b, &format!("{name}_3_conv"), linear(4 * filters, 1, 1, Padding::Valid), &[x])?;
    x = apply(b, &format!("{name}_3_bn"), batch_norm(BN_EPSILON), &[x])?;

    let sum = apply(b, &format!("{name}_add"), Op::Add, &[shortcut, x])?;
    apply(b, &format!("{name}_out"), relu(), &[sum])
}
