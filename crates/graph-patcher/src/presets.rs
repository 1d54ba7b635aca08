// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named patch presets for EfficientNet graphs.
//!
//! - **Remove fixed dropout**: every `blockXX_drop` layer (dropout with a
//!   fixed noise shape) is replaced by a plain dropout.
//! - **Fix broadcast**: after every `blockXX_se_expand` convolution, an
//!   identity layer declares the shape of the following broadcasting
//!   multiply.

use crate::{
    BroadcastFactory, DropoutFactory, InsertPosition, PatchError, Patcher, RenameStrategy,
};

/// Matches the fixed-noise-shape dropout layers inside EfficientNet blocks.
pub const FIXED_DROPOUT_PATTERN: &str = r".*block\w\w_drop.*";

/// Matches the squeeze-excite expansion convolutions.
pub const SE_EXPAND_PATTERN: &str = r".*block\w\w_se_expand.*";

/// Rate of the dropout that replaces fixed dropout.
pub const DEFAULT_DROPOUT_RATE: f32 = 0.2;

/// Replaces matches with `Dropout(rate)` named `"{matched}_dropout"`.
pub fn remove_fixed_dropout(pattern: &str, rate: f32) -> Result<Patcher<DropoutFactory>, PatchError> {
    Ok(Patcher::new(pattern, DropoutFactory::new(rate)?)?
        .position(InsertPosition::Replace)
        .rename(RenameStrategy::Prefix))
}

/// Inserts a broadcasting identity after each match.
pub fn fix_broadcast(pattern: &str) -> Result<Patcher<BroadcastFactory>, PatchError> {
    Ok(Patcher::new(pattern, BroadcastFactory)?
        .position(InsertPosition::After)
        .rename(RenameStrategy::Verbatim))
}
