//! Configuration for a training run.
//!
//! Loaded from a TOML file with four sections mirroring the pipeline:
//! where the data lives, which model to build, how to train it, and where
//! to write results. Every key has a default, so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Main configuration structure loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the reaction table and label vocabularies
    pub path: PathBuf,
    /// Reaction table name, read as `{path}/{file_name}.csv`
    pub file_name: String,
    /// Use the with-nitrogen vocabulary and model name
    pub with_n: bool,
    /// Condition column to predict: cat, solv, reag0..reag3
    pub target: String,
    /// `+`-separated fingerprint blocks, e.g. `rfp+pfp+rxnfp+solv`
    pub recipe: String,
}

/// Which network variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Two hidden ReLU layers over the fingerprint input
    Mlp,
    /// As `Mlp`, with dropout after each hidden layer
    DropoutMlp,
    /// Fingerprint input plus one-hot reaction template
    TemplateMlp,
}

impl ModelKind {
    pub fn uses_template(self) -> bool {
        matches!(self, ModelKind::TemplateMlp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    AdamW,
    Sgd,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub hidden1: usize,
    pub hidden2: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    CrossEntropy,
    LabelSmoothing(f64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub loss: LossKind,
    /// Steps per running-loss log line
    pub log_every: usize,
    /// Test batches scanned by the per-epoch validation pass
    pub validation_batches: usize,
    pub test_fraction: f64,
    /// Seed for splitting and shuffling; unseeded runs draw from entropy
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub model_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: PathBuf::from("data"),
            file_name: "1976-2016_5+".to_string(),
            with_n: false,
            target: "cat".to_string(),
            recipe: "rfp+pfp".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            kind: ModelKind::TemplateMlp,
            hidden1: 128,
            hidden2: 32,
            learning_rate: 1e-4,
            optimizer: OptimizerKind::Adam,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 1,
            batch_size: 128,
            loss: LossKind::CrossEntropy,
            log_every: 900,
            validation_batches: 101,
            test_fraction: 0.1,
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            model_dir: PathBuf::from("models"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Could not find {}, using default configuration",
                path.display()
            );
            return Ok(Config::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if self.training.batch_size == 0 {
            return invalid("training.batch_size must be positive");
        }
        if self.training.log_every == 0 {
            return invalid("training.log_every must be positive");
        }
        if self.training.validation_batches == 0 {
            return invalid("training.validation_batches must be positive");
        }
        if !(self.training.test_fraction > 0.0 && self.training.test_fraction < 1.0) {
            return invalid("training.test_fraction must be in (0, 1)");
        }
        if self.model.hidden1 == 0 || self.model.hidden2 == 0 {
            return invalid("model hidden widths must be positive");
        }
        if !(self.model.learning_rate > 0.0) {
            return invalid("model.learning_rate must be positive");
        }
        if let LossKind::LabelSmoothing(eps) = self.training.loss {
            if !(0.0..1.0).contains(&eps) {
                return invalid("label smoothing must be in [0, 1)");
            }
        }
        Ok(())
    }

    /// `{model_dir}/{target}_{file_name}_out.csv`
    pub fn metrics_path(&self) -> PathBuf {
        self.output.model_dir.join(format!(
            "{}_{}_out.csv",
            self.data.target, self.data.file_name
        ))
    }
}
