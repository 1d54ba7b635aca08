// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bounded parallel export of zoo models.
//!
//! Each model is built and saved on the blocking pool; at most
//! [`ExportConfig::jobs`] run at once. Outcomes are reported in completion
//! order and one failure never cancels the others.

use crate::{ExportConfig, ExportError};
use model_store::{ModelStore, SavedModel};
use model_zoo::ZooModel;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of exporting one model.
#[derive(Debug)]
pub struct ExportOutcome {
    pub model: ZooModel,
    pub result: Result<SavedModel, ExportError>,
}

impl ExportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Builds `model` and saves it with its summary.
pub fn export_model(model: ZooModel, config: &ExportConfig) -> Result<SavedModel, ExportError> {
    let graph = model.build(&config.zoo_options())?;
    let store = ModelStore::new(config.store_config());
    Ok(store.save_all(&graph)?)
}

/// Exports every model in `models`, `config.jobs` at a time.
///
/// Duplicates are exported once. Fails only if `config` is invalid.
pub async fn download_all(
    models: &[ZooModel],
    config: &ExportConfig,
) -> Result<Vec<ExportOutcome>, ExportError> {
    config.validate()?;

    let mut seen = HashSet::new();
    let unique: Vec<ZooModel> = models.iter().copied().filter(|m| seen.insert(*m)).collect();
    tracing::info!(
        "exporting {} model(s) with {} job(s) to {}",
        unique.len(),
        config.jobs,
        config.model_dir.display(),
    );

    let config = Arc::new(config.clone());
    let permits = Arc::new(Semaphore::new(config.jobs));
    let mut set = JoinSet::new();

    for model in unique {
        let config = Arc::clone(&config);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => {
                    match tokio::task::spawn_blocking(move || export_model(model, &config)).await {
                        Ok(result) => result,
                        Err(e) => Err(ExportError::Task(format!("{model}: {e}"))),
                    }
                }
                Err(e) => Err(ExportError::Task(format!("{model}: {e}"))),
            };
            ExportOutcome { model, result }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(outcome) => {
                match &outcome.result {
                    Ok(saved) => tracing::info!("{} saved to {}", outcome.model, saved.model.display()),
                    Err(e) => tracing::error!("{} failed: {e}", outcome.model),
                }
                outcomes.push(outcome);
            }
            Err(e) => tracing::error!("export task aborted: {e}"),
        }
    }
    Ok(outcomes)
}
