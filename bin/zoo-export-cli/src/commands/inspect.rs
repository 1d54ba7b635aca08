// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `zoo-export inspect` command: print a stored model's layer summary.

use anyhow::Context;
use exporter::ExportConfig;
use model_store::ModelStore;
use std::path::PathBuf;

pub async fn execute(config: ExportConfig, model: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              zoo-export · Model Inspector           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let store = ModelStore::new(config.store_config());
    let graph = store
        .load(&model)
        .with_context(|| format!("failed to load model from '{}'", model.display()))?;

    // ── Summary ────────────────────────────────────────────────
    println!("  File:    {}", model.display());
    println!("  Layers:  {}", graph.num_nodes());
    println!(
        "  Weights: {:.2} MB",
        graph
            .iter_nodes()
            .flat_map(|n| &n.weights)
            .map(|w| w.tensor.size_bytes())
            .sum::<usize>() as f64
            / (1024.0 * 1024.0),
    );
    println!();

    // ── Layers ─────────────────────────────────────────────────
    print!("{}", graph.summary());
    println!();
    Ok(())
}
