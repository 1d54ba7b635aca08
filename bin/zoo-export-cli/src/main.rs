// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # zoo-export
//!
//! Command-line interface for the model zoo exporter.
//!
//! ## Usage
//! ```bash
//! # Save every zoo model with its summary
//! zoo-export download --jobs 4
//!
//! # Rewrite the stored EfficientNets for converters
//! zoo-export fix-efficientnet --models EfficientNetB0,EfficientNetB3
//!
//! # Insert an identity after every stem convolution
//! zoo-export patch --model output_h5/EfficientNetB0.safetensors \
//!     --pattern stem_conv --position after --factory identity --output B0Probe
//!
//! # Print a stored model's summary
//! zoo-export inspect --model output_h5/EfficientNetB0Fixed.safetensors
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "zoo-export",
    about = "Export reference CNNs and patch their layer graphs",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models the zoo can build.
    List,

    /// Build zoo models and save weights, architecture and summary.
    Download {
        /// Comma-separated model names (default: every model).
        #[arg(short, long, value_delimiter = ',')]
        models: Vec<String>,

        /// Only the EfficientNet family.
        #[arg(long, conflicts_with = "models")]
        efficientnet_only: bool,

        /// Concurrent export jobs (overrides the configuration).
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Replace fixed dropout and add broadcasting identities to EfficientNets.
    FixEfficientnet {
        /// Comma-separated model names (default: every EfficientNet).
        #[arg(short, long, value_delimiter = ',')]
        models: Vec<String>,
    },

    /// Rewrite a stored model with a single pattern and factory.
    Patch {
        /// Stored model file.
        #[arg(short, long)]
        model: std::path::PathBuf,

        /// Regular expression matched against the start of node names.
        #[arg(short, long)]
        pattern: String,

        /// Where the new node goes: before, after or replace.
        #[arg(long, default_value = "after")]
        position: String,

        /// Factory building the new node: dropout, broadcast or identity.
        #[arg(short, long)]
        factory: String,

        /// Name for identity nodes.
        #[arg(long)]
        name: Option<String>,

        /// Dropout rate for the dropout factory.
        #[arg(long, default_value_t = 0.2)]
        rate: f32,

        /// Use the factory's name as-is instead of prefixing the matched name.
        #[arg(long)]
        verbatim: bool,

        /// Name of the patched model.
        #[arg(short, long)]
        output: String,
    },

    /// Print the layer summary of a stored model.
    Inspect {
        /// Stored model file.
        #[arg(short, long)]
        model: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => commands::list::execute().await,
        Commands::Download {
            models,
            efficientnet_only,
            jobs,
        } => commands::download::execute(config, models, efficientnet_only, jobs).await,
        Commands::FixEfficientnet { models } => commands::fix::execute(config, models).await,
        Commands::Patch {
            model,
            pattern,
            position,
            factory,
            name,
            rate,
            verbatim,
            output,
        } => {
            let args = commands::patch::PatchArgs {
                model,
                pattern,
                position,
                factory,
                name,
                rate,
                verbatim,
                output,
            };
            commands::patch::execute(config, args).await
        }
        Commands::Inspect { model } => commands::inspect::execute(config, model).await,
    }
}
