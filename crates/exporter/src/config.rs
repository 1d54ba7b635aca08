// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Export configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_dir = "output_h5"
//! summary_dir = "output_summary"
//! jobs = 8
//! dropout_rate = 0.2
//! dropout_pattern = '.*block\w\w_drop.*'
//! broadcast_pattern = '.*block\w\w_se_expand.*'
//! include_top = true
//! classes = 1000
//! # input_size = 224        # per-architecture default when unset
//! # scratch_dir = "/tmp"
//! ```

use crate::ExportError;
use graph_patcher::presets::{self, DEFAULT_DROPOUT_RATE, FIXED_DROPOUT_PATTERN, SE_EXPAND_PATTERN};
use model_store::StoreConfig;
use model_zoo::ZooOptions;
use std::path::{Path, PathBuf};

/// Upper bound on concurrent export jobs.
pub const MAX_JOBS: usize = 64;

/// Configuration shared by the download and fix pipelines.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving stored models.
    pub model_dir: PathBuf,
    /// Directory receiving text summaries.
    pub summary_dir: PathBuf,
    /// Directory for persist-and-reload scratch files.
    pub scratch_dir: Option<PathBuf>,
    /// Concurrent export jobs.
    pub jobs: usize,
    /// Rate of the dropout that replaces fixed dropout.
    pub dropout_rate: f32,
    /// Layers whose fixed dropout is replaced.
    pub dropout_pattern: String,
    /// Layers after which a broadcasting identity is inserted.
    pub broadcast_pattern: String,
    /// Square input edge; per-architecture default when `None`.
    pub input_size: Option<usize>,
    /// Include classification heads.
    pub include_top: bool,
    /// Classes of the heads.
    pub classes: usize,
}

impl ExportConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExportError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ExportError> {
        toml::from_str(toml_str)
            .map_err(|e| ExportError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ExportError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExportError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks value ranges and that both patterns compile.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=MAX_JOBS).contains(&self.jobs) {
            return Err(ExportError::ConfigError(format!(
                "jobs must be between 1 and {MAX_JOBS}, got {}",
                self.jobs
            )));
        }
        presets::remove_fixed_dropout(&self.dropout_pattern, self.dropout_rate)?;
        presets::fix_broadcast(&self.broadcast_pattern)?;
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            model_dir: self.model_dir.clone(),
            summary_dir: self.summary_dir.clone(),
            scratch_dir: self.scratch_dir.clone(),
        }
    }

    pub fn zoo_options(&self) -> ZooOptions {
        ZooOptions {
            input_size: self.input_size,
            include_top: self.include_top,
            classes: self.classes,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        let zoo = ZooOptions::default();
        Self {
            model_dir: store.model_dir,
            summary_dir: store.summary_dir,
            scratch_dir: store.scratch_dir,
            jobs: 8,
            dropout_rate: DEFAULT_DROPOUT_RATE,
            dropout_pattern: FIXED_DROPOUT_PATTERN.to_string(),
            broadcast_pattern: SE_EXPAND_PATTERN.to_string(),
            input_size: zoo.input_size,
            include_top: zoo.include_top,
            classes: zoo.classes,
        }
    }
}
