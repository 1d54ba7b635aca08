// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The named architectures and their build options.

use crate::{efficientnet, resnet, vgg, ZooError};
use layer_graph::{ModelGraph, Validated};
use std::fmt;
use std::str::FromStr;

/// Smallest input edge every architecture can take (five stride-2 stages).
pub const MIN_INPUT_SIZE: usize = 32;

/// Architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Vgg,
    ResNet,
    EfficientNet,
}

/// A model the zoo can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZooModel {
    Vgg16,
    Vgg19,
    ResNet50,
    ResNet101,
    ResNet152,
    EfficientNetB0,
    EfficientNetB1,
    EfficientNetB2,
    EfficientNetB3,
    EfficientNetB4,
    EfficientNetB5,
    EfficientNetB6,
    EfficientNetB7,
}

/// Options applied when building a [`ZooModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZooOptions {
    /// Square input edge; the architecture's default when `None`.
    pub input_size: Option<usize>,
    /// Include the classification head.
    pub include_top: bool,
    /// Classes of the head.
    pub classes: usize,
}

impl Default for ZooOptions {
    fn default() -> Self {
        Self {
            input_size: None,
            include_top: true,
            classes: 1000,
        }
    }
}

impl ZooModel {
    pub const ALL: [ZooModel; 13] = [
        ZooModel::Vgg16,
        ZooModel::Vgg19,
        ZooModel::ResNet50,
        ZooModel::ResNet101,
        ZooModel::ResNet152,
        ZooModel::EfficientNetB0,
        ZooModel::EfficientNetB1,
        ZooModel::EfficientNetB2,
        ZooModel::EfficientNetB3,
        ZooModel::EfficientNetB4,
        ZooModel::EfficientNetB5,
        ZooModel::EfficientNetB6,
        ZooModel::EfficientNetB7,
    ];

    /// Every model of a family, in registry order.
    pub fn of_family(family: Family) -> impl Iterator<Item = ZooModel> {
        Self::ALL.into_iter().filter(move |m| m.family() == family)
    }

    pub fn name(self) -> &'static str {
        match self {
            ZooModel::Vgg16 => "VGG16",
            ZooModel::Vgg19 => "VGG19",
            ZooModel::ResNet50 => "ResNet50",
            ZooModel::ResNet101 => "ResNet101",
            ZooModel::ResNet152 => "ResNet152",
            ZooModel::EfficientNetB0 => "EfficientNetB0",
            ZooModel::EfficientNetB1 => "EfficientNetB1",
            ZooModel::EfficientNetB2 => "EfficientNetB2",
            ZooModel::EfficientNetB3 => "EfficientNetB3",
            ZooModel::EfficientNetB4 => "EfficientNetB4",
            ZooModel::EfficientNetB5 => "EfficientNetB5",
            ZooModel::EfficientNetB6 => "EfficientNetB6",
            ZooModel::EfficientNetB7 => "EfficientNetB7",
        }
    }

    pub fn family(self) -> Family {
        match self {
            ZooModel::Vgg16 | ZooModel::Vgg19 => Family::Vgg,
            ZooModel::ResNet50 | ZooModel::ResNet101 | ZooModel::ResNet152 => Family::ResNet,
            _ => Family::EfficientNet,
        }
    }

    /// Input edge used when [`ZooOptions::input_size`] is `None`.
    pub fn default_input_size(self) -> usize {
        match self.efficientnet_variant() {
            Some(v) => efficientnet::SCALING[v].resolution,
            None => 224,
        }
    }

    /// Builds the model with deterministic weights.
    pub fn build(self, options: &ZooOptions) -> Result<ModelGraph<Validated>, ZooError> {
        let size = options.input_size.unwrap_or_else(|| self.default_input_size());
        self.check(options, size)?;
        tracing::debug!("building {} at {size}x{size}", self.name());

        let name = self.name();
        match self {
            ZooModel::Vgg16 => vgg::build(name, &vgg::VGG16, size, options),
            ZooModel::Vgg19 => vgg::build(name, &vgg::VGG19, size, options),
            ZooModel::ResNet50 => resnet::build(name, &resnet::RESNET50, size, options),
            ZooModel::ResNet101 => resnet::build(name, &resnet::RESNET101, size, options),
            ZooModel::ResNet152 => resnet::build(name, &resnet::RESNET152, size, options),
            _ => {
                let v = self.efficientnet_variant().unwrap_or_default();
                efficientnet::build(name, &efficientnet::SCALING[v], size, options)
            }
        }
    }

    fn efficientnet_variant(self) -> Option<usize> {
        match self {
            ZooModel::EfficientNetB0 => Some(0),
            ZooModel::EfficientNetB1 => Some(1),
            ZooModel::EfficientNetB2 => Some(2),
            ZooModel::EfficientNetB3 => Some(3),
            ZooModel::EfficientNetB4 => Some(4),
            ZooModel::EfficientNetB5 => Some(5),
            ZooModel::EfficientNetB6 => Some(6),
            ZooModel::EfficientNetB7 => Some(7),
            _ => None,
        }
    }

    fn check(self, options: &ZooOptions, size: usize) -> Result<(), ZooError> {
        let invalid = |detail: String| ZooError::InvalidOptions {
            model: self.name().to_string(),
            detail,
        };
        if size < MIN_INPUT_SIZE {
            return Err(invalid(format!(
                "input size {size} is below the minimum of {MIN_INPUT_SIZE}"
            )));
        }
        if options.include_top && options.classes == 0 {
            return Err(invalid("a classification head needs at least one class".into()));
        }
        Ok(())
    }
}

impl FromStr for ZooModel {
    type Err = ZooError;

    /// Case-insensitive lookup by [`ZooModel::name`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ZooError::UnknownModel(wanted.to_string()))
    }
}

impl fmt::Display for ZooModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("VGG16".parse::<ZooModel>().unwrap(), ZooModel::Vgg16);
        assert_eq!("efficientnetb3".parse::<ZooModel>().unwrap(), ZooModel::EfficientNetB3);
        assert!(matches!(
            "Xception".parse::<ZooModel>(),
            Err(ZooError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_names_roundtrip() {
        for m in ZooModel::ALL {
            assert_eq!(m.to_string().parse::<ZooModel>().unwrap(), m);
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(ZooModel::of_family(Family::EfficientNet).count(), 8);
        assert_eq!(ZooModel::of_family(Family::ResNet).count(), 3);
        assert_eq!(ZooModel::of_family(Family::Vgg).count(), 2);
    }

    #[test]
    fn test_default_input_sizes() {
        assert_eq!(ZooModel::Vgg16.default_input_size(), 224);
        assert_eq!(ZooModel::EfficientNetB0.default_input_size(), 224);
        assert_eq!(ZooModel::EfficientNetB7.default_input_size(), 600);
    }

    #[test]
    fn test_rejects_tiny_input() {
        let options = ZooOptions {
            input_size: Some(16),
            ..ZooOptions::default()
        };
        assert!(matches!(
            ZooModel::ResNet50.build(&options),
            Err(ZooError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_classes() {
        let options = ZooOptions {
            input_size: Some(32),
            include_top: true,
            classes: 0,
        };
        assert!(ZooModel::Vgg16.build(&options).is_err());
    }
}
