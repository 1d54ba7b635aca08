// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The EfficientNet fix pipeline.
//!
//! ```text
//! build → remove fixed dropout → persist+reload → fix broadcast → persist+reload → save "{name}Fixed"
//! ```

use crate::download::ExportOutcome;
use crate::{ExportConfig, ExportError};
use graph_patcher::presets;
use layer_graph::{ModelGraph, Validated};
use model_store::{ModelStore, SavedModel};
use model_zoo::{Family, ZooModel};

/// Suffix appended to the name of fixed models.
pub const FIXED_SUFFIX: &str = "Fixed";

/// Applies both patches to `graph`, reloading after each.
///
/// The result is named `"{name}Fixed"`.
pub fn fix_graph(
    graph: &ModelGraph<Validated>,
    config: &ExportConfig,
    store: &ModelStore,
) -> Result<ModelGraph<Validated>, ExportError> {
    let without_dropout =
        presets::remove_fixed_dropout(&config.dropout_pattern, config.dropout_rate)?.rewrite(graph)?;
    let reloaded = store.round_trip(&without_dropout)?;

    let broadcast = presets::fix_broadcast(&config.broadcast_pattern)?.rewrite(&reloaded)?;
    let mut fixed = store.round_trip(&broadcast)?;

    fixed.name = format!("{}{FIXED_SUFFIX}", graph.name);
    Ok(fixed)
}

/// Builds `model`, fixes it and saves it with its summary.
pub fn fix_efficientnet(model: ZooModel, config: &ExportConfig) -> Result<SavedModel, ExportError> {
    if model.family() != Family::EfficientNet {
        tracing::warn!("{model} is not an EfficientNet; the fix patterns will likely not match");
    }
    let store = ModelStore::new(config.store_config());
    let graph = model.build(&config.zoo_options())?;
    let fixed = fix_graph(&graph, config, &store)?;
    let saved = store.save_all(&fixed)?;
    tracing::info!("finished fixing {model}");
    Ok(saved)
}

/// Fixes each model in turn. A failure is reported and the rest still run.
pub fn fix_all(models: &[ZooModel], config: &ExportConfig) -> Result<Vec<ExportOutcome>, ExportError> {
    config.validate()?;
    Ok(models
        .iter()
        .map(|&model| ExportOutcome {
            model,
            result: fix_efficientnet(model, config),
        })
        .collect())
}
