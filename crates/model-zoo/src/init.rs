// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Deterministic weight initialisation.
//!
//! Every tensor is seeded from its node and weight name, so a model built
//! twice has identical weights regardless of build order or thread.
//!
//! - kernels: Glorot uniform, `U(-a, a)` with `a = sqrt(6 / (fan_in + fan_out))`
//! - `gamma`, `moving_variance`: ones
//! - everything else (biases, `beta`, `moving_mean`): zeros

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tensor_core::{DType, Shape, Tensor};

/// Creates the initial value of `node`'s `weight`.
pub fn initialize(node: &str, weight: &str, shape: &Shape) -> Tensor {
    match weight {
        "kernel" | "depthwise_kernel" => glorot_uniform(shape, seed(node, weight)),
        "gamma" | "moving_variance" => Tensor::filled_f32(shape.clone(), 1.0),
        _ => Tensor::zeros(shape.clone(), DType::F32),
    }
}

/// Glorot-uniform samples for `shape`.
pub fn glorot_uniform(shape: &Shape, seed: u64) -> Tensor {
    let (fan_in, fan_out) = fans(shape);
    let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Tensor::from_fn_f32(shape.clone(), |_| rng.gen_range(-limit..limit))
}

/// `(fan_in, fan_out)` with the receptive field folded in for conv kernels
/// (`[kh, kw, in, out]`).
fn fans(shape: &Shape) -> (usize, usize) {
    let dims = shape.dims();
    match dims.len() {
        0 => (1, 1),
        1 => (dims[0], dims[0]),
        n => {
            let receptive: usize = dims[..n - 2].iter().product();
            (receptive * dims[n - 2], receptive * dims[n - 1])
        }
    }
}

/// FNV-1a over `"{node}/{weight}"`.
fn seed(node: &str, weight: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    node.bytes()
        .chain(std::iter::once(b'/'))
        .chain(weight.bytes())
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}
