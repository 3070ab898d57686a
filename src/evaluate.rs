//! Top-1 / top-k accuracy and metrics output.

use std::cmp::Ordering;
use std::path::Path;

use ndarray::{Array2, ArrayView1};
use tracing::info;

use crate::dataset::{Batch, DataLoader};
use crate::error::{Error, Result};

/// Batches scanned by a bounded pass (validation during training).
pub const VALIDATION_BATCHES: usize = 101;

/// Anything that maps a batch to per-class scores, `[batch, n_classes]`.
pub trait Scorer {
    fn score(&self, batch: &Batch) -> Result<Array2<f32>>;
}

/// How much of the test partition an accuracy pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    All,
    FirstBatches(usize),
}

impl Coverage {
    /// `use_all = false` caps the pass at [`VALIDATION_BATCHES`].
    pub fn from_use_all(use_all: bool) -> Self {
        if use_all {
            Coverage::All
        } else {
            Coverage::FirstBatches(VALIDATION_BATCHES)
        }
    }

    fn limit(self) -> usize {
        match self {
            Coverage::All => usize::MAX,
            Coverage::FirstBatches(n) => n,
        }
    }
}

/// Running correct/total counts for one accuracy pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalTally {
    pub correct: usize,
    pub total: usize,
}

impl EvalTally {
    pub fn add(self, correct: usize, total: usize) -> Self {
        EvalTally {
            correct: self.correct + correct,
            total: self.total + total,
        }
    }

    /// `correct / total`; an empty tally is an error, not 0 or NaN.
    pub fn fraction(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(Error::EmptyEvaluation);
        }
        Ok(self.correct as f64 / self.total as f64)
    }
}

/// Indices of the `k` highest scores, best first. Equal scores rank the
/// lower class index first.
pub fn top_k_indices(scores: ArrayView1<'_, f32>, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| match scores[b].total_cmp(&scores[a]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
    indices.truncate(k);
    indices
}

/// Number of rows whose label is among that row's top `k` scores.
pub fn top_k_hits(scores: &Array2<f32>, labels: &[usize], k: usize) -> usize {
    scores
        .rows()
        .into_iter()
        .zip(labels)
        .filter(|(row, label)| top_k_indices(*row, k).contains(label))
        .count()
}

/// Fraction of examples whose label is in the model's top `k`.
///
/// `k` above the number of classes is clamped (every example counts as a
/// hit); `k == 0` is rejected. An empty pass is [`Error::EmptyEvaluation`].
pub fn topk_accuracy<S: Scorer + ?Sized>(
    model: &S,
    loader: &mut DataLoader,
    k: usize,
    coverage: Coverage,
) -> Result<f64> {
    if k == 0 {
        return Err(Error::InvalidTopK(k));
    }

    let mut tally = EvalTally::default();
    for batch in loader.batches().take(coverage.limit()) {
        let scores = model.score(&batch)?;
        let k = k.min(scores.ncols().max(1));
        tally = tally.add(top_k_hits(&scores, &batch.labels, k), batch.len());
    }
    tally.fraction()
}

/// Top-1 accuracy; `use_all = false` reads only the first
/// [`VALIDATION_BATCHES`] batches.
pub fn accuracy<S: Scorer + ?Sized>(model: &S, loader: &mut DataLoader, use_all: bool) -> Result<f64> {
    let acc = topk_accuracy(model, loader, 1, Coverage::from_use_all(use_all))?;
    info!("Accuracy on test set: {:.4}", acc);
    Ok(acc)
}

/// Final test-set metrics for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyReport {
    pub acc: f64,
    pub acc3: f64,
    pub acc10: f64,
}

impl AccuracyReport {
    /// Full-coverage top-1, top-3 and top-10 accuracy.
    pub fn compute<S: Scorer + ?Sized>(model: &S, loader: &mut DataLoader) -> Result<Self> {
        let acc = accuracy(model, loader, true)?;
        let acc3 = topk_accuracy(model, loader, 3, Coverage::All)?;
        info!("Top3 acc: {:.4}", acc3);
        let acc10 = topk_accuracy(model, loader, 10, Coverage::All)?;
        info!("Top10 acc: {:.4}", acc10);
        Ok(AccuracyReport { acc, acc3, acc10 })
    }

    /// Write as a one-row table with an index column: `,acc,acc3,acc10`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["", "acc", "acc3", "acc10"])?;
        wtr.write_record([
            "0".to_string(),
            self.acc.to_string(),
            self.acc3.to_string(),
            self.acc10.to_string(),
        ])?;
        wtr.flush()?;
        Ok(())
    }
}
