// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer operations.
//!
//! An [`Op`] is the transform a node applies: a pure function from input
//! shapes to an output shape, plus the list of weight tensors it needs.
//! Ops serialize with a `class_name` tag and a `config` body, so a stored
//! architecture reads like a layer configuration list.

use crate::GraphError;
use tensor_core::{DType, Shape};

/// Element-wise activation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Softmax,
    Swish,
}

/// Spatial padding mode for convolutions and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    #[default]
    Valid,
    Same,
}

/// Number of inputs an op accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Graph input, no predecessors.
    Source,
    /// Exactly one input.
    Unary,
    /// Two or more inputs merged element-wise.
    Merge,
}

/// The computation a layer performs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum Op {
    /// Graph input with a fixed shape (batch dimension included).
    #[serde(rename = "InputLayer")]
    Input { batch_input_shape: Shape },
    Conv2D {
        filters: usize,
        kernel_size: [usize; 2],
        strides: [usize; 2],
        padding: Padding,
        use_bias: bool,
        activation: Activation,
    },
    DepthwiseConv2D {
        kernel_size: [usize; 2],
        strides: [usize; 2],
        padding: Padding,
        depth_multiplier: usize,
        use_bias: bool,
        activation: Activation,
    },
    Dense {
        units: usize,
        use_bias: bool,
        activation: Activation,
    },
    BatchNormalization { epsilon: f32 },
    Activation { activation: Activation },
    MaxPooling2D {
        pool_size: [usize; 2],
        strides: [usize; 2],
        padding: Padding,
    },
    AveragePooling2D {
        pool_size: [usize; 2],
        strides: [usize; 2],
        padding: Padding,
    },
    GlobalAveragePooling2D,
    /// `padding` is `[[top, bottom], [left, right]]`.
    ZeroPadding2D { padding: [[usize; 2]; 2] },
    Flatten,
    /// Reshape to `target_shape` (batch dimension excluded).
    Reshape { target_shape: Vec<usize> },
    /// Dropout. A `noise_shape` fixes the mask shape (`None` entries follow
    /// the input), which is what the EfficientNet "fixed dropout" layer uses.
    Dropout {
        rate: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        noise_shape: Option<Vec<Option<usize>>>,
    },
    /// Identity. A declared `output_shape` (batch excluded) overrides the
    /// inferred one, which is how a broadcast is made explicit to importers
    /// that cannot infer it.
    Lambda {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_shape: Option<Vec<usize>>,
    },
    Add,
    Multiply,
}

impl Op {
    /// Plain dropout at `rate`.
    pub fn dropout(rate: f32) -> Self {
        Op::Dropout {
            rate,
            noise_shape: None,
        }
    }

    /// Identity with no declared shape.
    pub fn identity() -> Self {
        Op::Lambda { output_shape: None }
    }

    /// Returns the layer class name, as shown in summaries.
    pub fn class_name(&self) -> &'static str {
        match self {
            Op::Input { .. } => "InputLayer",
            Op::Conv2D { .. } => "Conv2D",
            Op::DepthwiseConv2D { .. } => "DepthwiseConv2D",
            Op::Dense { .. } => "Dense",
            Op::BatchNormalization { .. } => "BatchNormalization",
            Op::Activation { .. } => "Activation",
            Op::MaxPooling2D { .. } => "MaxPooling2D",
            Op::AveragePooling2D { .. } => "AveragePooling2D",
            Op::GlobalAveragePooling2D => "GlobalAveragePooling2D",
            Op::ZeroPadding2D { .. } => "ZeroPadding2D",
            Op::Flatten => "Flatten",
            Op::Reshape { .. } => "Reshape",
            Op::Dropout {
                noise_shape: Some(_),
                ..
            } => "FixedDropout",
            Op::Dropout { .. } => "Dropout",
            Op::Lambda { .. } => "Lambda",
            Op::Add => "Add",
            Op::Multiply => "Multiply",
        }
    }

    /// Returns how many inputs this op accepts.
    pub fn arity(&self) -> Arity {
        match self {
            Op::Input { .. } => Arity::Source,
            Op::Add | Op::Multiply => Arity::Merge,
            _ => Arity::Unary,
        }
    }

    /// Checks `count` against [`Op::arity`].
    pub fn check_arity(&self, node: &str, count: usize) -> Result<(), GraphError> {
        let ok = match self.arity() {
            Arity::Source => count == 0,
            Arity::Unary => count == 1,
            Arity::Merge => count >= 2,
        };
        if ok {
            Ok(())
        } else {
            Err(GraphError::layer(
                node,
                format!("{} does not accept {count} input(s)", self.class_name()),
            ))
        }
    }

    /// Infers the output shape from the input shapes.
    ///
    /// Fails on out-of-range configuration and on shapes whose size does
    /// not fit in memory, since both may come from a stored file.
    pub fn output_shape(&self, node: &str, inputs: &[&Shape]) -> Result<Shape, GraphError> {
        self.check_arity(node, inputs.len())?;
        if let Op::Dropout { rate, .. } = self {
            if !(0.0..1.0).contains(rate) {
                return Err(GraphError::layer(
                    node,
                    format!("dropout rate must be in [0, 1), got {rate}"),
                ));
            }
        }
        let shape = self.infer(node, inputs)?;
        addressable(node, &shape)?;
        Ok(shape)
    }

    fn infer(&self, node: &str, inputs: &[&Shape]) -> Result<Shape, GraphError> {
        match self {
            Op::Input { batch_input_shape } => Ok(batch_input_shape.clone()),

            Op::Conv2D {
                filters,
                kernel_size,
                strides,
                padding,
                ..
            } => {
                let [n, h, w, _] = nhwc(node, inputs[0])?;
                let (oh, ow) = spatial(node, (h, w), *kernel_size, *strides, *padding)?;
                Ok(Shape::nhwc(n, oh, ow, *filters))
            }

            Op::DepthwiseConv2D {
                kernel_size,
                strides,
                padding,
                depth_multiplier,
                ..
            } => {
                let [n, h, w, c] = nhwc(node, inputs[0])?;
                let (oh, ow) = spatial(node, (h, w), *kernel_size, *strides, *padding)?;
                let channels = c
                    .checked_mul(*depth_multiplier)
                    .ok_or_else(|| overflow(node, inputs[0]))?;
                Ok(Shape::nhwc(n, oh, ow, channels))
            }

            Op::MaxPooling2D {
                pool_size,
                strides,
                padding,
            }
            | Op::AveragePooling2D {
                pool_size,
                strides,
                padding,
            } => {
                let [n, h, w, c] = nhwc(node, inputs[0])?;
                let (oh, ow) = spatial(node, (h, w), *pool_size, *strides, *padding)?;
                Ok(Shape::nhwc(n, oh, ow, c))
            }

            Op::Dense { units, .. } => {
                if inputs[0].rank() < 2 {
                    return Err(GraphError::layer(node, "Dense needs an input of rank >= 2"));
                }
                Ok(inputs[0].with_last(*units))
            }

            Op::BatchNormalization { .. }
            | Op::Activation { .. }
            | Op::Dropout { .. }
            | Op::Lambda { output_shape: None } => Ok(inputs[0].clone()),

            Op::Lambda {
                output_shape: Some(declared),
            } => {
                let batch = inputs[0].batch().unwrap_or(1);
                Ok(Shape::with_batch(batch, declared))
            }

            Op::GlobalAveragePooling2D => {
                let [n, _, _, c] = nhwc(node, inputs[0])?;
                Ok(Shape::matrix(n, c))
            }

            Op::ZeroPadding2D { padding } => {
                let [n, h, w, c] = nhwc(node, inputs[0])?;
                let pad = |edge: usize, [a, b]: [usize; 2]| {
                    edge.checked_add(a)
                        .and_then(|e| e.checked_add(b))
                        .ok_or_else(|| overflow(node, inputs[0]))
                };
                Ok(Shape::nhwc(n, pad(h, padding[0])?, pad(w, padding[1])?, c))
            }

            Op::Flatten => {
                let batch = inputs[0].batch().unwrap_or(1);
                let rest = product(inputs[0].without_batch())
                    .ok_or_else(|| overflow(node, inputs[0]))?;
                Ok(Shape::matrix(batch, rest))
            }

            Op::Reshape { target_shape } => {
                let have = product(inputs[0].without_batch())
                    .ok_or_else(|| overflow(node, inputs[0]))?;
                let want = product(target_shape).ok_or_else(|| {
                    GraphError::layer(node, format!("target shape {target_shape:?} is too large"))
                })?;
                if have != want {
                    return Err(GraphError::layer(
                        node,
                        format!(
                            "cannot reshape {} into {:?}: {have} vs {want} elements",
                            inputs[0], target_shape
                        ),
                    ));
                }
                Ok(Shape::with_batch(
                    inputs[0].batch().unwrap_or(1),
                    target_shape,
                ))
            }

            Op::Add | Op::Multiply => {
                let mut out = inputs[0].clone();
                for shape in &inputs[1..] {
                    out = out.broadcast(shape).ok_or_else(|| {
                        GraphError::layer(
                            node,
                            format!("{} inputs do not broadcast: {out} vs {shape}", self.class_name()),
                        )
                    })?;
                }
                Ok(out)
            }
        }
    }

    /// Returns the weight tensors this op needs, in storage order.
    pub fn weight_shapes(
        &self,
        node: &str,
        inputs: &[&Shape],
    ) -> Result<Vec<(&'static str, Shape)>, GraphError> {
        let weights = self.declared_weights(node, inputs)?;
        for (_, shape) in &weights {
            addressable(node, shape)?;
        }
        Ok(weights)
    }

    fn declared_weights(
        &self,
        node: &str,
        inputs: &[&Shape],
    ) -> Result<Vec<(&'static str, Shape)>, GraphError> {
        let channels_in = || {
            inputs
                .first()
                .and_then(|s| s.last())
                .ok_or_else(|| GraphError::layer(node, "input has no channel dimension"))
        };
        Ok(match self {
            Op::Conv2D {
                filters,
                kernel_size,
                use_bias,
                ..
            } => {
                let cin = channels_in()?;
                let mut w = vec![(
                    "kernel",
                    Shape::new(vec![kernel_size[0], kernel_size[1], cin, *filters]),
                )];
                if *use_bias {
                    w.push(("bias", Shape::vector(*filters)));
                }
                w
            }
            Op::DepthwiseConv2D {
                kernel_size,
                depth_multiplier,
                use_bias,
                ..
            } => {
                let cin = channels_in()?;
                let mut w = vec![(
                    "depthwise_kernel",
                    Shape::new(vec![kernel_size[0], kernel_size[1], cin, *depth_multiplier]),
                )];
                if *use_bias {
                    let units = cin
                        .checked_mul(*depth_multiplier)
                        .ok_or_else(|| GraphError::layer(node, "depthwise bias is too large"))?;
                    w.push(("bias", Shape::vector(units)));
                }
                w
            }
            Op::Dense {
                units, use_bias, ..
            } => {
                let cin = channels_in()?;
                let mut w = vec![("kernel", Shape::matrix(cin, *units))];
                if *use_bias {
                    w.push(("bias", Shape::vector(*units)));
                }
                w
            }
            Op::BatchNormalization { .. } => {
                let c = channels_in()?;
                vec![
                    ("gamma", Shape::vector(c)),
                    ("beta", Shape::vector(c)),
                    ("moving_mean", Shape::vector(c)),
                    ("moving_variance", Shape::vector(c)),
                ]
            }
            _ => Vec::new(),
        })
    }

    /// Returns `true` if the named weight is updated by training.
    pub fn is_trainable_weight(&self, weight: &str) -> bool {
        !matches!(
            (self, weight),
            (Op::BatchNormalization { .. }, "moving_mean" | "moving_variance")
        )
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

fn product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn overflow(node: &str, input: &Shape) -> GraphError {
    GraphError::layer(node, format!("shape arithmetic on {input} overflows"))
}

/// Rejects shapes whose `f32` buffer size cannot be represented.
fn addressable(node: &str, shape: &Shape) -> Result<(), GraphError> {
    match shape.checked_size_bytes(DType::F32) {
        Some(_) => Ok(()),
        None => Err(GraphError::layer(node, format!("shape {shape} is too large"))),
    }
}

fn nhwc(node: &str, shape: &Shape) -> Result<[usize; 4], GraphError> {
    match shape.dims() {
        &[n, h, w, c] => Ok([n, h, w, c]),
        _ => Err(GraphError::layer(
            node,
            format!("expected a channel-last 4-D input, got {shape}"),
        )),
    }
}

fn spatial(
    node: &str,
    (h, w): (usize, usize),
    kernel: [usize; 2],
    strides: [usize; 2],
    padding: Padding,
) -> Result<(usize, usize), GraphError> {
    let out = |input: usize, k: usize, s: usize| -> Option<usize> {
        if s == 0 || k == 0 {
            return None;
        }
        match padding {
            Padding::Same => Some(input.div_ceil(s)),
            Padding::Valid if input >= k => Some((input - k) / s + 1),
            Padding::Valid => None,
        }
    };
    match (out(h, kernel[0], strides[0]), out(w, kernel[1], strides[1])) {
        (Some(oh), Some(ow)) if oh > 0 && ow > 0 => Ok((oh, ow)),
        _ => Err(GraphError::layer(
            node,
            format!(
                "window {kernel:?} with strides {strides:?} does not fit a {h}x{w} input"
            ),
        )),
    }
}
