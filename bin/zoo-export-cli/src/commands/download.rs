// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `zoo-export download` command: build zoo models and save them with
//! their summaries, several at a time.

use exporter::ExportConfig;
use model_zoo::{Family, ZooModel};
use std::time::Instant;

pub async fn execute(
    mut config: ExportConfig,
    models: Vec<String>,
    efficientnet_only: bool,
    jobs: Option<usize>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            zoo-export · Model Downloader            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    if let Some(jobs) = jobs {
        config.jobs = jobs;
    }
    let models = if efficientnet_only {
        ZooModel::of_family(Family::EfficientNet).collect()
    } else {
        super::parse_models(&models, ZooModel::ALL)?
    };

    println!("  Config:");
    println!("   Models:    {}", models.len());
    println!("   Jobs:      {}", config.jobs);
    println!("   Weights:   {}", config.model_dir.display());
    println!("   Summaries: {}", config.summary_dir.display());
    println!();

    // ── Export ─────────────────────────────────────────────────
    let start = Instant::now();
    let outcomes = exporter::download_all(&models, &config).await?;
    println!(
        "  Finished in {:.1}s",
        start.elapsed().as_secs_f64(),
    );
    println!();

    // ── Summary ────────────────────────────────────────────────
    super::report(&outcomes)
}
