// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! VGG16 / VGG19.

use crate::layers::{apply, conv, dense, max_pool};
use crate::{ZooError, ZooOptions};
use layer_graph::{Activation, GraphBuilder, ModelGraph, Op, Padding, Validated};
use tensor_core::Shape;

const FILTERS: [usize; 5] = [64, 128, 256, 512, 512];

/// Convolutions per block.
pub(crate) const VGG16: [usize; 5] = [2, 2, 3, 3, 3];
pub(crate) const VGG19: [usize; 5] = [2, 2, 4, 4, 4];

pub(crate) fn build(
    name: &str,
    convs: &[usize; 5],
    size: usize,
    options: &ZooOptions,
) -> Result<ModelGraph<Validated>, ZooError> {
    let mut b = GraphBuilder::new(name);
    let mut x = b.input("input_1", Shape::nhwc(1, size, size, 3))?;

    for (block, (&count, &filters)) in convs.iter().zip(&FILTERS).enumerate() {
        let block = block + 1;
        for i in 1..=count {
            x = apply(
                &mut b,
                &format!("block{block}_conv{i}"),
                conv(filters, 3, 1, Padding::Same, true, Activation::Relu),
                &[x],
            )?;
        }
        x = apply(&mut b, &format!("block{block}_pool"), max_pool(2, 2), &[x])?;
    }

    if options.include_top {
        x = apply(&mut b, "flatten", Op::Flatten, &[x])?;
        x = apply(&mut b, "fc1", dense(4096, Activation::Relu), &[x])?;
        x = apply(&mut b, "fc2", dense(4096, Activation::Relu), &[x])?;
        x = apply(
            &mut b,
            "predictions",
            dense(options.classes, Activation::Softmax),
            &[x],
        )?;
    }

    Ok(b.finish(x)?)
}
