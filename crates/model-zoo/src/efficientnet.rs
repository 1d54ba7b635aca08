// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! EfficientNet B0–B7.
//!
//! Every variant scales the B0 block table by a width and a depth
//! coefficient. Blocks are MBConv: optional 1x1 expansion, depthwise
//! convolution, squeeze-excite, 1x1 projection, and a residual add when
//! the block keeps its shape. Residual blocks past the first carry a
//! fixed-noise-shape dropout (`blockXX_drop`) before the add, and every
//! squeeze-excite ends with `blockXX_se_expand` feeding the broadcasting
//! `blockXX_se_excite` multiply.

use crate::layers::{activation, apply, batch_norm, conv, dense};
use crate::{ZooError, ZooOptions};
use layer_graph::{Activation, GraphBuilder, ModelGraph, NodeRef, Op, Padding, Validated};
use tensor_core::Shape;

const BN_EPSILON: f32 = 1e-3;
const DEPTH_DIVISOR: usize = 8;

/// Maximum drop rate, reached by the last block.
pub const DROP_CONNECT_RATE: f64 = 0.2;

/// Compound scaling of one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub width: f64,
    pub depth: f64,
    pub resolution: usize,
    pub dropout: f32,
}

/// B0 … B7.
pub const SCALING: [Scaling; 8] = [
    Scaling { width: 1.0, depth: 1.0, resolution: 224, dropout: 0.2 },
    Scaling { width: 1.0, depth: 1.1, resolution: 240, dropout: 0.2 },
    Scaling { width: 1.1, depth: 1.2, resolution: 260, dropout: 0.3 },
    Scaling { width: 1.2, depth: 1.4, resolution: 300, dropout: 0.3 },
    Scaling { width: 1.4, depth: 1.8, resolution: 380, dropout: 0.4 },
    Scaling { width: 1.6, depth: 2.2, resolution: 456, dropout: 0.4 },
    Scaling { width: 1.8, depth: 2.6, resolution: 528, dropout: 0.5 },
    Scaling { width: 2.0, depth: 3.1, resolution: 600, dropout: 0.5 },
];

#[derive(Debug, Clone, Copy)]
struct Stage {
    kernel: usize,
    repeats: usize,
    filters_in: usize,
    filters_out: usize,
    expand_ratio: usize,
    stride: usize,
}

const SE_RATIO: f64 = 0.25;

const STAGES: [Stage; 7] = [
    Stage { kernel: 3, repeats: 1, filters_in: 32, filters_out: 16, expand_ratio: 1, stride: 1 },
    Stage { kernel: 3, repeats: 2, filters_in: 16, filters_out: 24, expand_ratio: 6, stride: 2 },
    Stage { kernel: 5, repeats: 2, filters_in: 24, filters_out: 40, expand_ratio: 6, stride: 2 },
    Stage { kernel: 3, repeats: 3, filters_in: 40, filters_out: 80, expand_ratio: 6, stride: 2 },
    Stage { kernel: 5, repeats: 3, filters_in: 80, filters_out: 112, expand_ratio: 6, stride: 1 },
    Stage { kernel: 5, repeats: 4, filters_in: 112, filters_out: 192, expand_ratio: 6, stride: 2 },
    Stage { kernel: 3, repeats: 1, filters_in: 192, filters_out: 320, expand_ratio: 6, stride: 1 },
];

/// Scales a filter count by `width`, rounding to a multiple of 8 without
/// dropping more than 10%.
pub fn round_filters(filters: usize, width: f64) -> usize {
    let scaled = filters as f64 * width;
    let half = DEPTH_DIVISOR as f64 / 2.0;
    let mut rounded = ((scaled + half) as usize / DEPTH_DIVISOR * DEPTH_DIVISOR).max(DEPTH_DIVISOR);
    if (rounded as f64) < 0.9 * scaled {
        rounded += DEPTH_DIVISOR;
    }
    rounded
}

/// Scales a repeat count by `depth`, rounding up.
pub fn round_repeats(repeats: usize, depth: f64) -> usize {
    (depth * repeats as f64).ceil() as usize
}

pub(crate) fn build(
    name: &str,
    scaling: &Scaling,
    size: usize,
    options: &ZooOptions,
) -> Result<ModelGraph<Validated>, ZooError> {
    let swish = || activation(Activation::Swish);
    let mut b = GraphBuilder::new(name);
    let mut x = b.input("input_1", Shape::nhwc(1, size, size, 3))?;

    x = apply(
        &mut b,
        "stem_conv",
        conv(round_filters(32, scaling.width), 3, 2, Padding::Same, false, Activation::Linear),
        &[x],
    )?;
    x = apply(&mut b, "stem_bn", batch_norm(BN_EPSILON), &[x])?;
    x = apply(&mut b, "stem_activation", swish(), &[x])?;

    let total: usize = STAGES
        .iter()
        .map(|s| round_repeats(s.repeats, scaling.depth))
        .sum();
    let mut index = 0usize;

    for (i, stage) in STAGES.iter().enumerate() {
        let filters_in = round_filters(stage.filters_in, scaling.width);
        let filters_out = round_filters(stage.filters_out, scaling.width);
        for j in 0..round_repeats(stage.repeats, scaling.depth) {
            let block = Block {
                kernel: stage.kernel,
                expand_ratio: stage.expand_ratio,
                stride: if j == 0 { stage.stride } else { 1 },
                filters_in: if j == 0 { filters_in } else { filters_out },
                filters_out,
                drop_rate: (DROP_CONNECT_RATE * index as f64 / total as f64) as f32,
            };
            let letter = block_letter(j).ok_or_else(|| ZooError::InvalidOptions {
                model: name.to_string(),
                detail: format!("stage {} has more than 26 blocks", i + 1),
            })?;
            let prefix = format!("block{}{letter}", i + 1);
            x = block.apply(&mut b, &prefix, x)?;
            index += 1;
        }
    }

    x = apply(
        &mut b,
        "top_conv",
        conv(round_filters(1280, scaling.width), 1, 1, Padding::Same, false, Activation::Linear),
        &[x],
    )?;
    x = apply(&mut b, "top_bn", batch_norm(BN_EPSILON), &[x])?;
    x = apply(&mut b, "top_activation", swish(), &[x])?;

    if options.include_top {
        x = apply(&mut b, "avg_pool", Op::GlobalAveragePooling2D, &[x])?;
        if scaling.dropout > 0.0 {
            x = apply(&mut b, "top_dropout", Op::dropout(scaling.dropout), &[x])?;
        }
        x = apply(&mut b, "probs", dense(options.classes, Activation::Softmax), &[x])?;
    }

    Ok(b.finish(x)?)
}

/// Block suffix within a stage, `None` past `'z'`.
fn block_letter(j: usize) -> Option<char> {
    u8::try_from(j)
        .ok()
        .filter(|&j| j < 26)
        .map(|j| char::from(b'a' + j))
}

struct Block {
    kernel: usize,
    expand_ratio: usize,
    stride: usize,
    filters_in: usize,
    filters_out: usize,
    drop_rate: f32,
}

impl Block {
    fn apply(&self, b: &mut GraphBuilder, prefix: &str, inputs: NodeRef) -> Result<NodeRef, ZooError> {
        let swish = || activation(Activation::Swish);
        let n = |suffix: &str| format!("{prefix}_{suffix}");
        let filters = self.filters_in * self.expand_ratio;

        let mut x = inputs;
        if self.expand_ratio != 1 {
            x = apply(
                b,
                &n("expand_conv"),
                conv(filters, 1, 1, Padding::Same, false, Activation::Linear),
                &[x],
            )?;
            x = apply(b, &n("expand_bn"), batch_norm(BN_EPSILON), &[x])?;
            x = apply(b, &n("expand_activation"), swish(), &[x])?;
        }

        x = apply(
            b,
            &n("dwconv"),
            Op::DepthwiseConv2D {
                kernel_size: [self.kernel, self.kernel],
                strides: [self.stride, self.stride],
                padding: Padding::Same,
                depth_multiplier: 1,
                use_bias: false,
                activation: Activation::Linear,
            },
            &[x],
        )?;
        x = apply(b, &n("bn"), batch_norm(BN_EPSILON), &[x])?;
        x = apply(b, &n("activation"), swish(), &[x])?;

        // Squeeze-excite.
        let reduced = ((self.filters_in as f64 * SE_RATIO) as usize).max(1);
        let mut se = apply(b, &n("se_squeeze"), Op::GlobalAveragePooling2D, &[x])?;
        se = apply(
            b,
            &n("se_reshape"),
            Op::Reshape {
                target_shape: vec![1, 1, filters],
            },
            &[se],
        )?;
        se = apply(
            b,
            &n("se_reduce"),
            conv(reduced, 1, 1, Padding::Same, true, Activation::Swish),
            &[se],
        )?;
        se = apply(
            b,
            &n("se_expand"),
            conv(filters, 1, 1, Padding::Same, true, Activation::Sigmoid),
            &[se],
        )?;
        x = apply(b, &n("se_excite"), Op::Multiply, &[x, se])?;

        x = apply(
            b,
            &n("project_conv"),
            conv(self.filters_out, 1, 1, Padding::Same, false, Activation::Linear),
            &[x],
        )?;
        x = apply(b, &n("project_bn"), batch_norm(BN_EPSILON), &[x])?;

        if self.stride == 1 && self.filters_in == self.filters_out {
            if self.drop_rate > 0.0 {
                x = apply(
                    b,
                    &n("drop"),
                    Op::Dropout {
                        rate: self.drop_rate,
                        noise_shape: Some(vec![None, Some(1), Some(1), Some(1)]),
                    },
                    &[x],
                )?;
            }
            x = apply(b, &n("add"), Op::Add, &[x, inputs])?;
        }
        Ok(x)
    }
}
