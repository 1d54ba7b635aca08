// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Saving and loading graphs.
//!
//! A stored model is one SafeTensors file. Every weight is a tensor keyed
//! `"{layer}/{weight}"`; the header metadata carries the format marker and
//! the [`Architecture`] as JSON. Loading rebuilds the graph through a
//! [`GraphBuilder`], so output shapes are re-inferred and the result is
//! validated.

use crate::manifest::{tensor_key, Architecture, LayerEntry, WeightEntry};
use crate::{StoreConfig, StoreError};
use layer_graph::{
    render_summary, GraphBuilder, GraphError, GraphState, ModelGraph, NodeRef, Op, Validated,
    Weight,
};
use safetensors::tensor::{serialize_to_file, TensorView};
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tensor_core::{DType, Tensor};

/// Metadata key holding the format marker.
pub const FORMAT_KEY: &str = "format";
/// Metadata key holding the format version.
pub const FORMAT_VERSION_KEY: &str = "format_version";
/// Metadata key holding the architecture JSON.
pub const ARCHITECTURE_KEY: &str = "architecture";

const FORMAT_NAME: &str = "zoo-graph";
const FORMAT_VERSION: &str = "1";

/// Paths written by [`ModelStore::save_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedModel {
    pub model: PathBuf,
    pub summary: PathBuf,
}

/// Saves graphs under the directories of a [`StoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    config: StoreConfig,
}

impl ModelStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Writes `{model_dir}/{name}.safetensors`.
    pub fn save(&self, graph: &ModelGraph<Validated>) -> Result<PathBuf, StoreError> {
        let path = self.config.model_path(&graph.name);
        create_dir(&self.config.model_dir)?;
        write_graph(graph, &path)?;
        tracing::info!("saved '{}' to {}", graph.name, path.display());
        Ok(path)
    }

    /// Writes the layer table to `{summary_dir}/{name}.txt`.
    pub fn save_summary(&self, graph: &ModelGraph<Validated>) -> Result<PathBuf, StoreError> {
        let path = self.config.summary_path(&graph.name);
        create_dir(&self.config.summary_dir)?;
        std::fs::write(&path, render_summary(graph)).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!("wrote summary of '{}' to {}", graph.name, path.display());
        Ok(path)
    }

    /// Saves both the model and its summary.
    pub fn save_all(&self, graph: &ModelGraph<Validated>) -> Result<SavedModel, StoreError> {
        Ok(SavedModel {
            model: self.save(graph)?,
            summary: self.save_summary(graph)?,
        })
    }

    /// Loads a stored model from an explicit path.
    pub fn load(&self, path: &Path) -> Result<ModelGraph<Validated>, StoreError> {
        read_graph(path)
    }

    /// Loads the model called `name` from the model directory.
    pub fn load_named(&self, name: &str) -> Result<ModelGraph<Validated>, StoreError> {
        read_graph(&self.config.model_path(name))
    }

    /// Persists `graph` to a scratch file and loads it back.
    ///
    /// The reloaded graph has gone through shape inference and validation
    /// again. The scratch file is removed when this returns.
    pub fn round_trip<S: GraphState>(
        &self,
        graph: &ModelGraph<S>,
    ) -> Result<ModelGraph<Validated>, StoreError> {
        let scratch = match &self.config.scratch_dir {
            Some(dir) => {
                create_dir(dir)?;
                tempfile::Builder::new()
                    .prefix("zoo-graph-")
                    .suffix(".safetensors")
                    .tempfile_in(dir)
                    .map_err(|e| StoreError::io(dir, e))?
            }
            None => tempfile::Builder::new()
                .prefix("zoo-graph-")
                .suffix(".safetensors")
                .tempfile()
                .map_err(|e| StoreError::io(std::env::temp_dir(), e))?,
        };
        write_graph(graph, scratch.path())?;
        let reloaded = read_graph(scratch.path())?;
        tracing::debug!(
            "round-tripped '{}' through {}",
            reloaded.name,
            scratch.path().display()
        );
        Ok(reloaded)
    }
}

/// Writes `graph` to `path` in the stored-model format.
pub fn write_graph<S: GraphState>(graph: &ModelGraph<S>, path: &Path) -> Result<(), StoreError> {
    let architecture = Architecture::from_graph(graph);

    let mut views: Vec<(String, TensorView<'_>)> =
        Vec::with_capacity(architecture.total_weight_count());
    for node in graph.nodes() {
        for weight in &node.weights {
            let tensor = &weight.tensor;
            let view = TensorView::new(
                to_st_dtype(tensor.dtype()),
                tensor.shape().dims().to_vec(),
                tensor.as_bytes(),
            )
            .map_err(|e| StoreError::SafeTensors(format!("{}/{}: {e}", node.name, weight.name)))?;
            views.push((tensor_key(&node.name, &weight.name), view));
        }
    }

    let mut meta = HashMap::new();
    meta.insert(FORMAT_KEY.to_string(), FORMAT_NAME.to_string());
    meta.insert(FORMAT_VERSION_KEY.to_string(), FORMAT_VERSION.to_string());
    meta.insert(ARCHITECTURE_KEY.to_string(), architecture.to_json()?);

    serialize_to_file(views, Some(meta), path)
        .map_err(|e| StoreError::SafeTensors(format!("writing '{}': {e}", path.display())))
}

/// Reads a stored model and rebuilds a validated graph.
pub fn read_graph(path: &Path) -> Result<ModelGraph<Validated>, StoreError> {
    let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    // Memory-map the file so tensor data is copied once, into the graph.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| StoreError::io(path, e))?;
    decode(&mmap)
}

/// Rebuilds a validated graph from the bytes of a stored model.
pub fn decode(bytes: &[u8]) -> Result<ModelGraph<Validated>, StoreError> {
    let architecture = read_architecture(bytes)?;
    let tensors = SafeTensors::deserialize(bytes)
        .map_err(|e| StoreError::SafeTensors(format!("parse error: {e}")))?;

    let expected = architecture.total_weight_count();
    if tensors.len() != expected {
        tracing::warn!(
            "'{}' stores {} tensor(s) but its layers declare {}",
            architecture.name,
            tensors.len(),
            expected,
        );
    }

    let mut builder = GraphBuilder::new(architecture.name.clone());
    let mut refs: HashMap<&str, NodeRef> = HashMap::with_capacity(architecture.layers.len());
    let mut last = None;

    for layer in &architecture.layers {
        let r = match &layer.op {
            Op::Input { batch_input_shape } if builder.is_empty() => {
                builder.input(&layer.name, batch_input_shape.clone())?
            }
            _ => {
                let inputs = layer
                    .inbound_nodes
                    .iter()
                    .map(|input| {
                        refs.get(input.as_str())
                            .copied()
                            .ok_or_else(|| GraphError::UnknownInput {
                                node: layer.name.clone(),
                                input: input.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let weights = layer
                    .weights
                    .iter()
                    .map(|entry| read_weight(&tensors, layer, entry))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.add_with_weights(&layer.name, layer.op.clone(), &inputs, weights)?
            }
        };
        refs.insert(&layer.name, r);
        last = Some(r);
    }

    let last = last.ok_or_else(|| {
        GraphError::InvalidGraph(format!("stored model '{}' has no layers", architecture.name))
    })?;
    Ok(builder.finish(last)?)
}

/// Reads only the header: format marker and architecture.
pub fn read_architecture(bytes: &[u8]) -> Result<Architecture, StoreError> {
    let (_, metadata) = SafeTensors::read_metadata(bytes)
        .map_err(|e| StoreError::SafeTensors(format!("header error: {e}")))?;
    let info = metadata
        .metadata()
        .as_ref()
        .ok_or_else(|| StoreError::Format("no header metadata".into()))?;

    match info.get(FORMAT_KEY).map(String::as_str) {
        Some(FORMAT_NAME) => {}
        other => {
            return Err(StoreError::Format(format!(
                "expected format '{FORMAT_NAME}', found {other:?}"
            )))
        }
    }
    match info.get(FORMAT_VERSION_KEY).map(String::as_str) {
        Some(FORMAT_VERSION) => {}
        other => {
            return Err(StoreError::Format(format!(
                "unsupported format version {other:?}"
            )))
        }
    }

    let json = info
        .get(ARCHITECTURE_KEY)
        .ok_or_else(|| StoreError::Format("no architecture in header".into()))?;
    Ok(Architecture::from_json(json)?)
}

fn read_weight(
    tensors: &SafeTensors<'_>,
    layer: &LayerEntry,
    entry: &WeightEntry,
) -> Result<Weight, StoreError> {
    let key = tensor_key(&layer.name, &entry.name);
    let view = tensors.tensor(&key).map_err(|_| StoreError::MissingWeight {
        layer: layer.name.clone(),
        weight: entry.name.clone(),
    })?;

    let mismatch = |detail: String| StoreError::WeightMismatch {
        layer: layer.name.clone(),
        weight: entry.name.clone(),
        detail,
    };
    let dtype = from_st_dtype(view.dtype())
        .ok_or_else(|| mismatch(format!("unsupported dtype {:?}", view.dtype())))?;
    if dtype != entry.dtype {
        return Err(mismatch(format!("stored as {dtype}, declared {}", entry.dtype)));
    }
    if view.shape() != entry.shape.dims() {
        return Err(mismatch(format!(
            "stored shape {:?}, declared {}",
            view.shape(),
            entry.shape
        )));
    }

    let tensor = Tensor::from_bytes(entry.shape.clone(), dtype, view.data().to_vec())?;
    Ok(Weight::new(entry.name.clone(), tensor))
}

fn create_dir(dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))
}

fn to_st_dtype(dtype: DType) -> Dtype {
    match dtype {
        DType::F32 => Dtype::F32,
        DType::F16 => Dtype::F16,
        DType::BF16 => Dtype::BF16,
        DType::I8 => Dtype::I8,
    }
}

fn from_st_dtype(dtype: Dtype) -> Option<DType> {
    match dtype {
        Dtype::F32 => Some(DType::F32),
        Dtype::F16 => Some(DType::F16),
        Dtype::BF16 => Some(DType::BF16),
        Dtype::I8 => Some(DType::I8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_graph::{Activation, Padding};
    use tempfile::TempDir;
    use tensor_core::Shape;

    fn counting(node: &str, weight: &str, shape: &Shape) -> Tensor {
        let seed = (node.len() * 31 + weight.len()) as f32;
        let values: Vec<f32> = (0..shape.num_elements())
            .map(|i| seed + i as f32 * 0.5)
            .collect();
        Tensor::from_f32(shape.clone(), &values).unwrap()
    }

    fn small_cnn() -> ModelGraph<Validated> {
        let mut b = GraphBuilder::new("small_cnn");
        let x = b.input("input_1", Shape::nhwc(1, 8, 8, 3)).unwrap();
        let c = b
            .add_initialized(
                "conv",
                Op::Conv2D {
                    filters: 4,
                    kernel_size: [3, 3],
                    strides: [1, 1],
                    padding: Padding::Same,
                    use_bias: true,
                    activation: Activation::Linear,
                },
                &[x],
                counting,
            )
            .unwrap();
        let bn = b
            .add_initialized("bn", Op::BatchNormalization { epsilon: 1e-3 }, &[c], counting)
            .unwrap();
        let act = b
            .add("relu", Op::Activation { activation: Activation::Relu }, &[bn])
            .unwrap();
        let sum = b.add("add", Op::Add, &[act, c]).unwrap();
        let gap = b.add("avg_pool", Op::GlobalAveragePooling2D, &[sum]).unwrap();
        let fc = b
            .add_initialized(
                "predictions",
                Op::Dense {
                    units: 5,
                    use_bias: true,
                    activation: Activation::Softmax,
                },
                &[gap],
                counting,
            )
            .unwrap();
        b.finish(fc).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.safetensors");
        let graph = small_cnn();
        write_graph(&graph, &path).unwrap();
        let back = read_graph(&path).unwrap();
        assert_eq!(back.name, graph.name);
        assert_eq!(back.nodes(), graph.nodes());
    }

    #[test]
    fn test_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.safetensors");
        write_graph(&small_cnn(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let arch = read_architecture(&bytes).unwrap();
        assert_eq!(arch.layers.len(), 7);
        assert_eq!(arch.layers[4].inbound_nodes, ["relu", "conv"]);
    }

    #[test]
    fn test_rejects_foreign_safetensors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.safetensors");
        let data = vec![0u8; 16];
        let view = TensorView::new(Dtype::F32, vec![4], &data).unwrap();
        serialize_to_file(vec![("w".to_string(), view)], None, &path).unwrap();
        assert!(matches!(read_graph(&path), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_graph(&dir.path().join("nope.safetensors")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_missing_weight_tensor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.safetensors");
        let graph = small_cnn();
        let mut arch = Architecture::from_graph(&graph);
        arch.layers[1].weights[0].name = "renamed".into();

        // Same tensors, but the manifest now points at a key that is absent.
        let mut meta = HashMap::new();
        meta.insert(FORMAT_KEY.to_string(), FORMAT_NAME.to_string());
        meta.insert(FORMAT_VERSION_KEY.to_string(), FORMAT_VERSION.to_string());
        meta.insert(ARCHITECTURE_KEY.to_string(), arch.to_json().unwrap());
        let views: Vec<(String, TensorView<'_>)> = graph
            .nodes()
            .iter()
            .flat_map(|n| n.weights.iter().map(move |w| (n, w)))
            .map(|(n, w)| {
                let t = &w.tensor;
                let view = TensorView::new(Dtype::F32, t.shape().dims().to_vec(), t.as_bytes())
                    .unwrap();
                (tensor_key(&n.name, &w.name), view)
            })
            .collect();
        serialize_to_file(views, Some(meta), &path).unwrap();

        match read_graph(&path).unwrap_err() {
            StoreError::MissingWeight { layer, weight } => {
                assert_eq!(layer, "conv");
                assert_eq!(weight, "renamed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_store_paths() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(StoreConfig::under(dir.path()));
        let saved = store.save_all(&small_cnn()).unwrap();
        assert_eq!(saved.model, dir.path().join("output_h5/small_cnn.safetensors"));
        assert_eq!(saved.summary, dir.path().join("output_summary/small_cnn.txt"));
        let summary = std::fs::read_to_string(&saved.summary).unwrap();
        assert!(summary.contains("Model: \"small_cnn\""));
        assert_eq!(store.load_named("small_cnn").unwrap().num_nodes(), 7);
    }

    #[test]
    fn test_round_trip_cleans_up_scratch() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        let store = ModelStore::new(StoreConfig {
            scratch_dir: Some(scratch.clone()),
            ..StoreConfig::under(dir.path())
        });
        let graph = small_cnn();
        let back = store.round_trip(&graph).unwrap();
        assert_eq!(back.nodes(), graph.nodes());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }
}
