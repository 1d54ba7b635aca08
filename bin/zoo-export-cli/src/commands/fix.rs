// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `zoo-export fix-efficientnet` command: replace fixed-shape dropout and
//! make squeeze-excite broadcasting explicit.

use exporter::ExportConfig;
use model_zoo::{Family, ZooModel};

pub async fn execute(config: ExportConfig, models: Vec<String>) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            zoo-export · EfficientNet Fixer          ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let models = super::parse_models(&models, ZooModel::of_family(Family::EfficientNet))?;

    println!("  Config:");
    println!("   Models:    {}", models.len());
    println!("   Dropout:   '{}' -> rate {}", config.dropout_pattern, config.dropout_rate);
    println!("   Broadcast: '{}'", config.broadcast_pattern);
    println!();

    // Each fix builds and round-trips whole graphs; keep it off the runtime.
    let outcomes =
        tokio::task::spawn_blocking(move || exporter::fix_all(&models, &config)).await??;

    // ── Summary ────────────────────────────────────────────────
    super::report(&outcomes)
}
