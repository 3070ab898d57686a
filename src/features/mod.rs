//! Feature assembly for reaction condition prediction.
//!
//! Turns raw reaction records into model inputs:
//!
//! - [`target`] - which condition column is predicted, and where its labels live
//! - [`vocabulary`] - ordered label sets read from reference CSV headers
//! - [`recipe`] - which fingerprint blocks make up an input vector
//! - [`assemble`] - parallel fingerprinting and dataset construction

pub mod assemble;
pub mod recipe;
pub mod target;
pub mod vocabulary;

use std::path::Path;
use std::time::Instant;

use tracing::info;

pub use assemble::{assemble, AssembledDataset, AssembledExample, AssemblyReport, SkipReason};
pub use recipe::{Component, InputRecipe};
pub use target::{nitrogen_suffix, Target};
pub use vocabulary::LabelVocabulary;

use crate::error::Result;
use crate::fingerprint::Fingerprinter;
use crate::load_records;

/// Load everything needed for one training run and assemble the dataset.
///
/// The target and recipe are validated before any file is read, so a bad
/// configuration fails without partial work.
pub fn prepare_dataset<F: Fingerprinter + ?Sized>(
    data_dir: &Path,
    file_name: &str,
    with_n: bool,
    target: &str,
    recipe: &str,
    fingerprinter: &F,
) -> Result<AssembledDataset> {
    let target: Target = target.parse()?;
    let recipe: InputRecipe = recipe.parse()?;

    let vocabulary = LabelVocabulary::load(&target.vocabulary_path(data_dir, with_n))?;
    info!("n {}: {}", target, vocabulary.len());

    let start = Instant::now();
    let records = load_records(&data_dir.join(format!("{file_name}.csv")))?;
    info!(
        "Loaded {} records ({:.2}s)",
        records.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(assemble(
        &records,
        target,
        &recipe,
        &vocabulary,
        fingerprinter,
    ))
}
