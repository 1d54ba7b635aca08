// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable model summary table.
//!
//! ```text
//! Model: "EfficientNetB0"
//! ____________________________________________________________________________________________________
//! Layer (type)                        Output Shape           Param #       Connected to
//! ====================================================================================================
//! input_1 (InputLayer)                (1, 224, 224, 3)       0
//! ____________________________________________________________________________________________________
//! stem_conv (Conv2D)                  (1, 112, 112, 32)      864           input_1
//! ...
//! ```

use crate::{ModelGraph, Validated};
use std::fmt::Write;

const WIDTH: usize = 100;
const COLUMNS: [usize; 3] = [36, 23, 14];

/// Renders the layer-by-layer summary of a validated graph.
pub fn render_summary(graph: &ModelGraph<Validated>) -> String {
    let mut out = String::new();
    let thin = "_".repeat(WIDTH);
    let thick = "=".repeat(WIDTH);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Model: \"{}\"", graph.name);
    let _ = writeln!(out, "{thin}");
    push_row(&mut out, "Layer (type)", "Output Shape", "Param #", "Connected to");
    let _ = writeln!(out, "{thick}");

    let last = graph.num_nodes() - 1;
    for (i, node) in graph.iter_nodes().enumerate() {
        let label = format!("{} ({})", node.name, node.class_name());
        let first_input = node.inputs.first().map(String::as_str).unwrap_or("");
        push_row(
            &mut out,
            &label,
            &node.output_shape.to_string(),
            &node.param_count().to_string(),
            first_input,
        );
        for extra in node.inputs.iter().skip(1) {
            push_row(&mut out, "", "", "", extra);
        }
        let _ = writeln!(out, "{}", if i == last { &thick } else { &thin });
    }

    let total = graph.total_params();
    let trainable = graph.trainable_params();
    let _ = writeln!(out, "Total params: {}", group_digits(total));
    let _ = writeln!(out, "Trainable params: {}", group_digits(trainable));
    let _ = writeln!(out, "Non-trainable params: {}", group_digits(total - trainable));
    let _ = writeln!(out, "{thin}");
    out
}

fn push_row(out: &mut String, layer: &str, shape: &str, params: &str, connected: &str) {
    let _ = writeln!(
        out,
        "{:<w0$} {:<w1$} {:<w2$} {}",
        layer,
        shape,
        params,
        connected,
        w0 = COLUMNS[0] - 1,
        w1 = COLUMNS[1] - 1,
        w2 = COLUMNS[2] - 1,
    );
}

/// Formats `n` with thousands separators (`5330564` → `5,330,564`).
fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, Op};
    use tensor_core::{DType, Shape, Tensor};

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(5_330_564), "5,330,564");
    }

    #[test]
    fn test_render() {
        let mut b = GraphBuilder::new("tiny");
        let x = b.input("input_1", Shape::nhwc(1, 4, 4, 2)).unwrap();
        let bn = b
            .add_initialized(
                "bn",
                Op::BatchNormalization { epsilon: 1e-3 },
                &[x],
                |_, _, s| Tensor::zeros(s.clone(), DType::F32),
            )
            .unwrap();
        let sum = b.add("sum", Op::Add, &[x, bn]).unwrap();
        let graph = b.finish(sum).unwrap();

        let text = render_summary(&graph);
        assert!(text.starts_with("Model: \"tiny\""));
        assert!(text.contains("bn (BatchNormalization)"));
        assert!(text.contains("(1, 4, 4, 2)"));
        assert!(text.contains("Total params: 8"));
        assert!(text.contains("Trainable params: 4"));
        assert!(text.contains("Non-trainable params: 4"));
        // Both inputs of the merge are listed.
        let sum_line = text.lines().position(|l| l.starts_with("sum (Add)")).unwrap();
        let next = text.lines().nth(sum_line + 1).unwrap();
        assert!(next.trim_end().ends_with("bn"));
    }
}
