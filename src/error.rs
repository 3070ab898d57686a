use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("target must be one of 'cat', 'solv', 'reag0', 'reag1', 'reag2', 'reag3', got {0:?}")]
    UnknownTarget(String),

    #[error("unknown input recipe component: {0:?}")]
    UnknownRecipeComponent(String),

    #[error("label vocabulary {0} has no columns")]
    EmptyVocabulary(PathBuf),

    #[error("cannot compute accuracy over zero examples")]
    EmptyEvaluation,

    #[error("top-k requires k >= 1, got {0}")]
    InvalidTopK(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("loss diverged to {loss} at epoch {epoch}, step {step}")]
    Divergence { epoch: usize, step: usize, loss: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "torch")]
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),
}
