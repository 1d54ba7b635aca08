// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where stored models and summaries go.
//!
//! # TOML Format
//! ```toml
//! model_dir = "output_h5"
//! summary_dir = "output_summary"
//! scratch_dir = "/tmp"        # optional; system temp dir otherwise
//! ```

use crate::StoreError;
use std::path::{Path, PathBuf};

/// File extension of stored models.
pub const MODEL_EXTENSION: &str = "safetensors";

/// Output locations for a [`crate::ModelStore`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoreConfig {
    /// Directory receiving `{name}.safetensors`.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    /// Directory receiving `{name}.txt` summaries.
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
    /// Directory for persist-and-reload scratch files.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("output_h5")
}

fn default_summary_dir() -> PathBuf {
    PathBuf::from("output_summary")
}

impl StoreConfig {
    /// Stores everything below `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            model_dir: root.join(default_model_dir()),
            summary_dir: root.join(default_summary_dir()),
            scratch_dir: Some(root.to_path_buf()),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, StoreError> {
        toml::from_str(toml_str)
            .map_err(|e| StoreError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, StoreError> {
        toml::to_string_pretty(self)
            .map_err(|e| StoreError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Path of the stored model called `name`.
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.model_dir.join(format!("{name}.{MODEL_EXTENSION}"))
    }

    /// Path of the summary of the model called `name`.
    pub fn summary_path(&self, name: &str) -> PathBuf {
        self.summary_dir.join(format!("{name}.txt"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            summary_dir: default_summary_dir(),
            scratch_dir: None,
        }
    }
}
