// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `zoo-export patch` command: apply one rewrite to a stored model.

use anyhow::Context;
use exporter::{ExportConfig, FactoryKind, PatchRequest};
use graph_patcher::{InsertPosition, RenameStrategy};
use model_store::ModelStore;
use std::path::PathBuf;

/// Arguments of the `patch` subcommand.
pub struct PatchArgs {
    pub model: PathBuf,
    pub pattern: String,
    pub position: String,
    pub factory: String,
    pub name: Option<String>,
    pub rate: f32,
    pub verbatim: bool,
    pub output: String,
}

pub async fn execute(config: ExportConfig, args: PatchArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              zoo-export · Graph Patcher             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let request = PatchRequest {
        pattern: args.pattern,
        position: args.position.parse::<InsertPosition>()?,
        rename: if args.verbatim {
            RenameStrategy::Verbatim
        } else {
            RenameStrategy::Prefix
        },
        factory: FactoryKind::new(&args.factory, args.name.as_deref(), args.rate)?,
        output: args.output,
    };

    println!("  Input:    {}", args.model.display());
    println!("  Pattern:  '{}'", request.pattern);
    println!("  Position: {}", request.position);
    println!("  Factory:  {}", args.factory);
    println!();

    let store = ModelStore::new(config.store_config());
    let saved = exporter::patch_stored(&args.model, &request, &store)
        .with_context(|| format!("failed to patch '{}'", args.model.display()))?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Model:    {}", saved.model.display());
    println!("  Summary:  {}", saved.summary.display());
    println!();
    Ok(())
}
