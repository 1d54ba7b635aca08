// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the helpers they share.

pub mod download;
pub mod fix;
pub mod inspect;
pub mod list;
pub mod patch;

use anyhow::Context;
use exporter::ExportConfig;
use model_zoo::ZooModel;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the `-v` count.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads the export configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ExportConfig> {
    let config = match path {
        Some(p) => ExportConfig::from_file(p)
            .with_context(|| format!("failed to load config '{}'", p.display()))?,
        None => ExportConfig::default(),
    };
    tracing::debug!("configuration: {config:?}");
    Ok(config)
}

/// Parses model names, falling back to `default` when none are given.
pub fn parse_models(
    names: &[String],
    default: impl IntoIterator<Item = ZooModel>,
) -> anyhow::Result<Vec<ZooModel>> {
    if names.is_empty() {
        return Ok(default.into_iter().collect());
    }
    names
        .iter()
        .map(|n| n.parse::<ZooModel>().map_err(anyhow::Error::from))
        .collect()
}

/// Prints the per-model outcome table and fails if any model failed.
pub fn report(outcomes: &[exporter::ExportOutcome]) -> anyhow::Result<()> {
    println!("  {:<20} {:<8} {}", "Model", "Status", "Output");
    println!("  {}", "-".repeat(72));
    for outcome in outcomes {
        match &outcome.result {
            Ok(saved) => println!(
                "  {:<20} {:<8} {}",
                outcome.model.name(),
                "ok",
                saved.model.display(),
            ),
            Err(e) => println!("  {:<20} {:<8} {e}", outcome.model.name(), "FAILED"),
        }
    }
    println!();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    println!("  {} succeeded, {failed} failed", outcomes.len() - failed);
    println!();
    if failed > 0 {
        anyhow::bail!("{failed} model(s) failed");
    }
    Ok(())
}
