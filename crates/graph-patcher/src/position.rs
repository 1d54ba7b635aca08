// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where a replacement goes, and what it is called.

use crate::PatchError;
use std::fmt;
use std::str::FromStr;

/// Where the factory-built node is spliced relative to a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    /// New node consumes the matched node's input; the matched node then
    /// consumes the new node's output. The matched node must be unary.
    Before,
    /// Matched node runs first; the new node consumes its output.
    #[default]
    After,
    /// New node takes the matched node's place; the matched transform is
    /// dropped together with its weights.
    Replace,
}

impl InsertPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
            InsertPosition::Replace => "replace",
        }
    }
}

impl FromStr for InsertPosition {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "before" => Ok(InsertPosition::Before),
            "after" => Ok(InsertPosition::After),
            "replace" => Ok(InsertPosition::Replace),
            other => Err(PatchError::Configuration(format!(
                "position must be one of 'before', 'after' or 'replace', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the inserted node is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameStrategy {
    /// `"{matched}_{factory name}"`.
    #[default]
    Prefix,
    /// The factory's name as-is.
    Verbatim,
}

impl RenameStrategy {
    pub(crate) fn apply(self, matched: &str, factory_name: &str) -> String {
        match self {
            RenameStrategy::Prefix => format!("{matched}_{factory_name}"),
            RenameStrategy::Verbatim => factory_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        assert_eq!("after".parse::<InsertPosition>().unwrap(), InsertPosition::After);
        assert_eq!("Replace".parse::<InsertPosition>().unwrap(), InsertPosition::Replace);
        assert_eq!(" before ".parse::<InsertPosition>().unwrap(), InsertPosition::Before);
    }

    #[test]
    fn test_parse_unknown_position() {
        let err = "around".parse::<InsertPosition>().unwrap_err();
        assert!(matches!(err, PatchError::Configuration(_)));
        assert!(err.to_string().contains("around"));
    }

    #[test]
    fn test_display_roundtrip() {
        for p in [InsertPosition::Before, InsertPosition::After, InsertPosition::Replace] {
            assert_eq!(p.to_string().parse::<InsertPosition>().unwrap(), p);
        }
    }

    #[test]
    fn test_rename() {
        assert_eq!(RenameStrategy::Prefix.apply("block2b_drop", "dropout"), "block2b_drop_dropout");
        assert_eq!(RenameStrategy::Verbatim.apply("block2b_drop", "dropout"), "dropout");
    }
}
