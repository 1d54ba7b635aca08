// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One-off rewrites of stored models.

use crate::ExportError;
use graph_patcher::{
    BroadcastFactory, DropoutFactory, IdentityFactory, InsertPosition, LayerFactory, Patcher,
    RenameStrategy, Replacement, ShapeHint,
};
use model_store::{ModelStore, SavedModel};
use std::path::Path;
use std::str::FromStr;

/// A stock factory chosen at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryKind {
    Dropout(DropoutFactory),
    Broadcast(BroadcastFactory),
    Identity(IdentityFactory),
}

impl FactoryKind {
    /// Resolves a factory by name. `name` only applies to `identity`,
    /// `rate` only to `dropout`, where it must be in `[0, 1)`.
    pub fn new(kind: &str, name: Option<&str>, rate: f32) -> Result<Self, ExportError> {
        match kind.trim().to_lowercase().as_str() {
            "dropout" => Ok(FactoryKind::Dropout(DropoutFactory::new(rate)?)),
            "broadcast" => Ok(FactoryKind::Broadcast(BroadcastFactory)),
            "identity" => Ok(FactoryKind::Identity(IdentityFactory::new(
                name.unwrap_or("identity"),
            ))),
            other => Err(ExportError::ConfigError(format!(
                "unknown factory '{other}'; expected 'dropout', 'broadcast' or 'identity'"
            ))),
        }
    }
}

impl FromStr for FactoryKind {
    type Err = ExportError;

    /// Parses a factory name with default settings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FactoryKind::new(s, None, graph_patcher::presets::DEFAULT_DROPOUT_RATE)
    }
}

impl LayerFactory for FactoryKind {
    fn base_name(&self, hint: Option<ShapeHint>) -> String {
        match self {
            FactoryKind::Dropout(f) => f.base_name(hint),
            FactoryKind::Broadcast(f) => f.base_name(hint),
            FactoryKind::Identity(f) => f.base_name(hint),
        }
    }

    fn build(&self, name: &str, hint: Option<ShapeHint>) -> Replacement {
        match self {
            FactoryKind::Dropout(f) => f.build(name, hint),
            FactoryKind::Broadcast(f) => f.build(name, hint),
            FactoryKind::Identity(f) => f.build(name, hint),
        }
    }
}

/// A rewrite of a stored model, saved under a new name.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub pattern: String,
    pub position: InsertPosition,
    pub rename: RenameStrategy,
    pub factory: FactoryKind,
    /// Name of the patched model.
    pub output: String,
}

/// Loads `path`, applies `request`, reloads and saves the result.
pub fn patch_stored(
    path: &Path,
    request: &PatchRequest,
    store: &ModelStore,
) -> Result<SavedModel, ExportError> {
    let graph = store.load(path)?;
    let patched = Patcher::new(&request.pattern, request.factory.clone())?
        .position(request.position)
        .rename(request.rename)
        .rewrite(&graph)?;
    let mut reloaded = store.round_trip(&patched)?;
    reloaded.name = request.output.clone();

    tracing::info!(
        "patched '{}' into '{}' ({} → {} layers)",
        graph.name,
        reloaded.name,
        graph.num_nodes(),
        reloaded.num_nodes(),
    );
    Ok(store.save_all(&reloaded)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_graph::Op;

    #[test]
    fn test_factory_kinds() {
        assert_eq!(
            "broadcast".parse::<FactoryKind>().unwrap(),
            FactoryKind::Broadcast(BroadcastFactory)
        );
        let id = FactoryKind::new("Identity", Some("probe"), 0.5).unwrap();
        assert_eq!(id.build("ignored_1", None).name, "probe");
        let drop = FactoryKind::new("dropout", None, 0.5).unwrap();
        assert_eq!(drop.build("x", None).op, Op::dropout(0.5));
    }

    #[test]
    fn test_unknown_factory() {
        assert!(matches!(
            FactoryKind::new("conv", None, 0.2),
            Err(ExportError::ConfigError(_))
        ));
    }

    #[test]
    fn test_dropout_rate_checked() {
        for rate in [5.0, -1.0, 1.0, f32::NAN] {
            assert!(matches!(
                FactoryKind::new("dropout", None, rate),
                Err(ExportError::Patch(graph_patcher::PatchError::Configuration(_)))
            ));
        }
        // Only the dropout factory reads the rate.
        assert!(FactoryKind::new("broadcast", None, 5.0).is_ok());
    }

    #[test]
    fn test_delegates_base_name() {
        let hint = Some(ShapeHint { width: 7, depth: 320 });
        let kind = FactoryKind::Broadcast(BroadcastFactory);
        assert_eq!(kind.base_name(hint), "broadcast_w7_d320");
    }
}
