//! Training loop for the condition classifiers.
//!
//! The pieces here are framework-independent: the running-loss window, the
//! loop state, the dataset shape a model consumes, and where trained models
//! are stored. The tch models and the loop that drives them are compiled with
//! the `torch` feature.

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::config::{Config, ModelKind, OptimizerKind};
use crate::dataset::{one_hot_templates, Batch};
use crate::evaluate::VALIDATION_BATCHES;
use crate::features::{nitrogen_suffix, Target};

#[cfg(feature = "torch")]
pub mod loss;
#[cfg(feature = "torch")]
pub mod model;
#[cfg(feature = "torch")]
pub mod pipeline;
#[cfg(feature = "torch")]
pub mod trainer;

#[cfg(feature = "torch")]
pub use model::{ConditionModel, ModelDims};
#[cfg(feature = "torch")]
pub use pipeline::{evaluate_saved, run, run_with, RunOutcome};
#[cfg(feature = "torch")]
pub use trainer::Trainer;

/// Steps per running-loss log line.
pub const LOG_EVERY: usize = 900;

/// Averages the training loss over fixed windows of steps.
///
/// Each window is reported once and then cleared; nothing carries over into
/// the next window or the next epoch.
#[derive(Debug, Clone)]
pub struct LossWindow {
    every: usize,
    sum: f64,
    count: usize,
}

impl LossWindow {
    pub fn new(every: usize) -> Self {
        LossWindow {
            every: every.max(1),
            sum: 0.0,
            count: 0,
        }
    }

    /// Add the loss of step `step` (0-based within the epoch). Returns the
    /// window average when `step` closes a window.
    pub fn record(&mut self, step: usize, loss: f64) -> Option<f64> {
        self.sum += loss;
        self.count += 1;
        if step % self.every != self.every - 1 {
            return None;
        }
        let average = self.sum / self.every as f64;
        self.reset();
        Some(average)
    }

    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    /// Steps accumulated since the last report.
    pub fn pending(&self) -> usize {
        self.count
    }
}

impl Default for LossWindow {
    fn default() -> Self {
        LossWindow::new(LOG_EVERY)
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainPhase {
    #[default]
    Idle,
    Epoch(usize),
    Batch { epoch: usize, step: usize },
}

impl fmt::Display for TrainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainPhase::Idle => write!(f, "idle"),
            TrainPhase::Epoch(epoch) => write!(f, "epoch {}", epoch + 1),
            TrainPhase::Batch { epoch, step } => write!(f, "[{}, {:5}]", epoch + 1, step + 1),
        }
    }
}

/// What a model sees besides the fingerprint input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetShape {
    Flat,
    /// Each example also carries a one-hot template of this width.
    TemplateConditioned { template_space: usize },
}

impl DatasetShape {
    pub fn for_model(kind: ModelKind, template_space: usize) -> Self {
        if kind.uses_template() {
            DatasetShape::TemplateConditioned { template_space }
        } else {
            DatasetShape::Flat
        }
    }

    /// Extra input columns contributed by the template.
    pub fn template_width(&self) -> usize {
        match self {
            DatasetShape::Flat => 0,
            DatasetShape::TemplateConditioned { template_space } => *template_space,
        }
    }

    /// One-hot template rows for `batch`, `None` for flat models.
    pub fn template_input(&self, batch: &Batch) -> Option<Array2<f32>> {
        match self {
            DatasetShape::Flat => None,
            DatasetShape::TemplateConditioned { template_space } => {
                Some(one_hot_templates(&batch.templates, *template_space))
            }
        }
    }
}

/// Loop parameters taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSettings {
    pub epochs: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub log_every: usize,
    pub validation_batches: usize,
}

impl TrainSettings {
    pub fn from_config(config: &Config) -> Self {
        TrainSettings {
            epochs: config.training.epochs,
            learning_rate: config.model.learning_rate,
            optimizer: config.model.optimizer,
            log_every: config.training.log_every,
            validation_batches: config.training.validation_batches,
        }
    }
}

impl Default for TrainSettings {
    fn default() -> Self {
        TrainSettings {
            epochs: 1,
            learning_rate: 1e-4,
            optimizer: OptimizerKind::Adam,
            log_every: LOG_EVERY,
            validation_batches: VALIDATION_BATCHES,
        }
    }
}

/// One reported loss window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossPoint {
    pub epoch: usize,
    pub step: usize,
    pub loss: f64,
}

/// What a finished training run logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainHistory {
    pub losses: Vec<LossPoint>,
    /// Bounded top-1 validation accuracy after each epoch
    pub validation: Vec<f64>,
}

/// `{model_dir}/{target}_model_{withN|withoutN}.pt`
pub fn model_path(model_dir: &Path, target: Target, with_n: bool) -> PathBuf {
    model_dir.join(format!("{}_model_{}.pt", target, nitrogen_suffix(with_n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Batch;

    #[test]
    fn test_loss_window_reports_every_n_steps() {
        let mut window = LossWindow::new(3);
        assert_eq!(window.record(0, 1.0), None);
        assert_eq!(window.record(1, 2.0), None);
        assert_eq!(window.record(2, 3.0), Some(2.0));
        assert_eq!(window.pending(), 0);

        assert_eq!(window.record(3, 6.0), None);
        assert_eq!(window.record(4, 6.0), None);
        assert_eq!(window.record(5, 6.0), Some(6.0));
    }

    #[test]
    fn test_loss_window_default_is_900() {
        let mut window = LossWindow::default();
        let reports: Vec<f64> = (0..1800).filter_map(|step| window.record(step, 0.5)).collect();
        assert_eq!(reports, vec![0.5, 0.5]);
    }

    #[test]
    fn test_loss_window_reset_between_epochs() {
        let mut window = LossWindow::new(2);
        window.record(0, 10.0);
        window.reset();
        assert_eq!(window.record(0, 1.0), None);
        assert_eq!(window.record(1, 3.0), Some(2.0));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(TrainPhase::default(), TrainPhase::Idle);
        assert_eq!(TrainPhase::Epoch(0).to_string(), "epoch 1");
        assert_eq!(
            TrainPhase::Batch { epoch: 1, step: 899 }.to_string(),
            "[2,   900]"
        );
    }

    #[test]
    fn test_dataset_shape() {
        assert_eq!(DatasetShape::for_model(ModelKind::Mlp, 7), DatasetShape::Flat);
        assert_eq!(DatasetShape::for_model(ModelKind::DropoutMlp, 7).template_width(), 0);

        let shape = DatasetShape::for_model(ModelKind::TemplateMlp, 4);
        assert_eq!(shape.template_width(), 4);

        let batch = Batch {
            inputs: Array2::zeros((2, 3)),
            templates: vec![3, 1],
            labels: vec![0, 0],
        };
        let onehot = shape.template_input(&batch).unwrap();
        assert_eq!(onehot.shape(), &[2, 4]);
        assert_eq!(onehot[[0, 3]], 1.0);
        assert_eq!(onehot[[1, 1]], 1.0);
        assert_eq!(onehot.sum(), 2.0);
        assert!(DatasetShape::Flat.template_input(&batch).is_none());
    }

    #[test]
    fn test_model_path() {
        let dir = Path::new("models");
        assert_eq!(
            model_path(dir, Target::Catalyst, false),
            PathBuf::from("models/cat_model_withoutN.pt")
        );
        assert_eq!(
            model_path(dir, Target::Reagent2, true),
            PathBuf::from("models/reag2_model_withN.pt")
        );
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.training.epochs = 4;
        config.model.learning_rate = 1e-3;
        let settings = TrainSettings::from_config(&config);
        assert_eq!(settings.epochs, 4);
        assert_eq!(settings.learning_rate, 1e-3);
        assert_eq!(settings.log_every, 900);
        assert_eq!(settings.validation_batches, 101);
    }
}
