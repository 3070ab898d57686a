//! Feed-forward condition classifiers on tch.
//!
//! All three variants share one layout: two ReLU hidden layers and a linear
//! output over the vocabulary. They differ in what goes in (template one-hot
//! or not) and whether dropout follows the hidden layers.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tch::{nn, nn::ModuleT, Device, Kind, Tensor};
use tracing::info;

use super::DatasetShape;
use crate::config::ModelKind;
use crate::dataset::Batch;
use crate::error::Result;
use crate::evaluate::Scorer;

/// Dropout probability of the `DropoutMlp` hidden layers.
pub const DROPOUT_RATE: f64 = 0.2;

/// Everything needed to rebuild a model before loading its weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelDims {
    pub kind: ModelKind,
    pub num_classes: usize,
    pub input_width: usize,
    pub template_space: usize,
    pub hidden1: usize,
    pub hidden2: usize,
}

impl ModelDims {
    pub fn shape(&self) -> DatasetShape {
        DatasetShape::for_model(self.kind, self.template_space)
    }

    /// Width of the first layer's input.
    pub fn network_input(&self) -> usize {
        self.input_width + self.shape().template_width()
    }
}

pub struct ConditionModel {
    device: Device,
    vs: nn::VarStore,
    net: nn::SequentialT,
    dims: ModelDims,
}

impl ConditionModel {
    pub fn new(dims: ModelDims) -> Self {
        let device = Device::cuda_if_available();
        info!("Model device: {:?}", device);

        let mut vs = nn::VarStore::new(device);
        vs.set_kind(Kind::Float);
        let net = build_network(&vs.root(), &dims);

        ConditionModel {
            device,
            vs,
            net,
            dims,
        }
    }

    pub fn dims(&self) -> &ModelDims {
        &self.dims
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// `[batch, network_input]` float tensor on the model device.
    pub fn input_tensor(&self, batch: &Batch) -> Result<Tensor> {
        let inputs = to_tensor(&batch.inputs)?;
        let xs = match self.dims.shape().template_input(batch) {
            Some(templates) => Tensor::cat(&[inputs, to_tensor(&templates)?], 1),
            None => inputs,
        };
        Ok(xs.to(self.device))
    }

    pub fn label_tensor(&self, batch: &Batch) -> Tensor {
        let labels: Vec<i64> = batch.labels.iter().map(|&l| l as i64).collect();
        Tensor::from_slice(&labels).to(self.device)
    }

    /// Unnormalized class scores, `[batch, num_classes]`.
    pub fn forward_t(&self, batch: &Batch, train: bool) -> Result<Tensor> {
        let xs = self.input_tensor(batch)?;
        Ok(self.net.forward_t(&xs, train))
    }

    /// Save weights to `path` and the dimensions next to it as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.vs.save(path)?;
        std::fs::write(dims_path(path), serde_json::to_string_pretty(&self.dims)?)?;
        info!("Model saved to {}", path.display());
        Ok(())
    }

    /// Rebuild the network from the saved dimensions and load its weights.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(dims_path(path))?;
        let dims: ModelDims = serde_json::from_str(&json)?;
        let mut model = ConditionModel::new(dims);
        model.vs.load(path)?;
        Ok(model)
    }
}

impl Scorer for ConditionModel {
    fn score(&self, batch: &Batch) -> Result<Array2<f32>> {
        let probs = tch::no_grad(|| -> Result<Tensor> {
            let logits = self.forward_t(batch, false)?;
            Ok(logits.softmax(-1, Kind::Float).to(Device::Cpu))
        })?;
        let values = Vec::<f32>::try_from(&probs.flatten(0, -1))?;
        Ok(Array2::from_shape_vec(
            (batch.len(), self.dims.num_classes),
            values,
        )?)
    }
}

fn build_network(root: &nn::Path, dims: &ModelDims) -> nn::SequentialT {
    let dropout = match dims.kind {
        ModelKind::DropoutMlp => DROPOUT_RATE,
        _ => 0.0,
    };
    let widths = [dims.network_input(), dims.hidden1, dims.hidden2];

    let mut net = nn::seq_t();
    for (i, pair) in widths.windows(2).enumerate() {
        net = net
            .add(nn::linear(
                root / format!("fc{}", i + 1),
                pair[0] as i64,
                pair[1] as i64,
                Default::default(),
            ))
            .add_fn(|x| x.relu());
        if dropout > 0.0 {
            net = net.add_fn_t(move |x, train| x.dropout(dropout, train));
        }
    }
    net.add(nn::linear(
        root / "output",
        dims.hidden2 as i64,
        dims.num_classes as i64,
        Default::default(),
    ))
}

fn to_tensor(values: &Array2<f32>) -> Result<Tensor> {
    let (rows, cols) = values.dim();
    let flat: Vec<f32> = values.iter().copied().collect();
    Ok(Tensor::from_slice(&flat).f_view([rows as i64, cols as i64])?)
}

fn dims_path(weights: &Path) -> PathBuf {
    weights.with_extension("json")
}
