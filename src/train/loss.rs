//! Loss functions and optimizer selection.

use tch::nn::{self, OptimizerConfig};
use tch::{Reduction, Tensor};

use crate::config::{LossKind, OptimizerKind};
use crate::error::Result;

/// Maps logits `[batch, classes]` and target indices `[batch]` to a scalar loss.
pub trait LossFunction {
    fn loss(&self, logits: &Tensor, targets: &Tensor) -> Tensor;
}

impl LossFunction for LossKind {
    fn loss(&self, logits: &Tensor, targets: &Tensor) -> Tensor {
        match *self {
            LossKind::CrossEntropy => logits.cross_entropy_for_logits(targets),
            LossKind::LabelSmoothing(epsilon) => logits.cross_entropy_loss::<Tensor>(
                targets,
                None,
                Reduction::Mean,
                -100,
                epsilon,
            ),
        }
    }
}

pub fn build_optimizer(
    kind: OptimizerKind,
    vs: &nn::VarStore,
    learning_rate: f64,
) -> Result<nn::Optimizer> {
    let opt = match kind {
        OptimizerKind::Adam => nn::Adam::default().build(vs, learning_rate)?,
        OptimizerKind::AdamW => nn::AdamW::default().build(vs, learning_rate)?,
        OptimizerKind::Sgd => nn::Sgd::default().build(vs, learning_rate)?,
    };
    Ok(opt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_entropy_matches_manual() {
        let logits = Tensor::from_slice(&[2.0f32, 0.0, 0.0, 0.0, 2.0, 0.0]).view([2, 3]);
        let targets = Tensor::from_slice(&[0i64, 1]);
        let loss = f64::try_from(&LossKind::CrossEntropy.loss(&logits, &targets)).unwrap();
        let expected = -(2f64.exp() / (2f64.exp() + 2.0)).ln();
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_label_smoothing_raises_confident_loss() {
        let logits = Tensor::from_slice(&[8.0f32, 0.0, 0.0]).view([1, 3]);
        let targets = Tensor::from_slice(&[0i64]);
        let plain = f64::try_from(&LossKind::CrossEntropy.loss(&logits, &targets)).unwrap();
        let smoothed =
            f64::try_from(&LossKind::LabelSmoothing(0.1).loss(&logits, &targets)).unwrap();
        assert!(smoothed > plain);
    }

    #[test]
    fn test_build_each_optimizer() {
        let vs = nn::VarStore::new(tch::Device::Cpu);
        let _w = vs.root().zeros("w", &[2, 2]);
        for kind in [OptimizerKind::Adam, OptimizerKind::AdamW, OptimizerKind::Sgd] {
            assert!(build_optimizer(kind, &vs, 1e-3).is_ok());
        }
    }
}
