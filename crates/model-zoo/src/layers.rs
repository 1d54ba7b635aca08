// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Op shorthands shared by the architectures.

use crate::init::initialize;
use crate::ZooError;
use layer_graph::{Activation, GraphBuilder, NodeRef, Op, Padding};

/// Adds a node, initialising its weights deterministically.
pub(crate) fn apply(
    b: &mut GraphBuilder,
    name: &str,
    op: Op,
    inputs: &[NodeRef],
) -> Result<NodeRef, ZooError> {
    Ok(b.add_initialized(name, op, inputs, initialize)?)
}

/// Square-kernel convolution.
pub(crate) fn conv(
    filters: usize,
    kernel: usize,
    stride: usize,
    padding: Padding,
    use_bias: bool,
    activation: Activation,
) -> Op {
    Op::Conv2D {
        filters,
        kernel_size: [kernel, kernel],
        strides: [stride, stride],
        padding,
        use_bias,
        activation,
    }
}

pub(crate) fn batch_norm(epsilon: f32) -> Op {
    Op::BatchNormalization { epsilon }
}

pub(crate) fn activation(activation: Activation) -> Op {
    Op::Activation { activation }
}

pub(crate) fn max_pool(size: usize, stride: usize) -> Op {
    Op::MaxPooling2D {
        pool_size: [size, size],
        strides: [stride, stride],
        padding: Padding::Valid,
    }
}

pub(crate) fn dense(units: usize, activation: Activation) -> Op {
    Op::Dense {
        units,
        use_bias: true,
        activation,
    }
}

pub(crate) fn zero_pad(amount: usize) -> Op {
    Op::ZeroPadding2D {
        padding: [[amount, amount], [amount, amount]],
    }
}
