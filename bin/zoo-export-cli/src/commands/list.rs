// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `zoo-export list` command: print the models the zoo can build.

use model_zoo::ZooModel;

pub async fn execute() -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               zoo-export · Model Zoo                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    println!("  {:<20} {:<14} {:>10}", "Model", "Family", "Input");
    println!("  {}", "-".repeat(46));
    for model in ZooModel::ALL {
        let size = model.default_input_size();
        println!(
            "  {:<20} {:<14} {:>10}",
            model.name(),
            format!("{:?}", model.family()),
            format!("{size}x{size}"),
        );
    }
    println!();
    Ok(())
}
