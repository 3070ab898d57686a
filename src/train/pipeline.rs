//! End-to-end training run: data → model → metrics.

use std::path::PathBuf;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::loss::LossFunction;
use super::model::{ConditionModel, ModelDims};
use super::trainer::Trainer;
use super::{model_path, DatasetShape, TrainHistory, TrainSettings};
use crate::config::Config;
use crate::dataset::{make_rng, train_test_split, DataLoader, Shuffle};
use crate::error::{Error, Result};
use crate::evaluate::AccuracyReport;
use crate::features::{prepare_dataset, AssembledDataset, AssemblyReport, Target};
use crate::fingerprint::{Fingerprinter, MorganFingerprinter};

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub assembly: AssemblyReport,
    pub shape: DatasetShape,
    pub train_size: usize,
    pub test_size: usize,
    pub history: TrainHistory,
    pub report: AccuracyReport,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
}

/// Train with Morgan fingerprints and the configured loss.
pub fn run(config: &Config) -> Result<RunOutcome> {
    let fingerprinter = MorganFingerprinter::default();
    info!("Morgan fingerprints via {}", fingerprinter.backend());
    run_with(config, &fingerprinter, &config.training.loss)
}

/// Run the whole pipeline for one (target, recipe) configuration.
///
/// The model is saved to `{model_dir}/{target}_model_{withN|withoutN}.pt`
/// after the last epoch; top-1/3/10 accuracy over the full test partition
/// is written to `{model_dir}/{target}_{file_name}_out.csv`.
pub fn run_with<F, L>(config: &Config, fingerprinter: &F, loss_fn: &L) -> Result<RunOutcome>
where
    F: Fingerprinter + ?Sized,
    L: LossFunction + ?Sized,
{
    config.validate()?;
    let target: Target = config.data.target.parse()?;
    let start = Instant::now();

    let dataset = prepare_dataset(
        &config.data.path,
        &config.data.file_name,
        config.data.with_n,
        &config.data.target,
        &config.data.recipe,
        fingerprinter,
    )?;

    let dims = ModelDims {
        kind: config.model.kind,
        num_classes: dataset.vocabulary_size,
        input_width: dataset.input_width,
        template_space: dataset.template_space,
        hidden1: config.model.hidden1,
        hidden2: config.model.hidden2,
    };
    let assembly = dataset.report;
    let (mut train, mut test, shape) = loaders(config, dataset);
    let model = ConditionModel::new(dims);

    let settings = TrainSettings::from_config(config);
    let history = Trainer::new(settings, loss_fn).fit(&model, &mut train, &mut test)?;

    let model_path = model_path(&config.output.model_dir, target, config.data.with_n);
    model.save(&model_path)?;

    let report = AccuracyReport::compute(&model, &mut test)?;
    let metrics_path = config.metrics_path();
    report.write_csv(&metrics_path)?;
    info!(
        "Metrics saved to {} ({:.2}s total)",
        metrics_path.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(RunOutcome {
        assembly,
        shape,
        train_size: train.len(),
        test_size: test.len(),
        history,
        report,
        model_path,
        metrics_path,
    })
}

/// Re-score a saved model on its run's test partition.
///
/// The partition only matches the training run when `training.seed` is set.
pub fn evaluate_saved<F: Fingerprinter + ?Sized>(
    config: &Config,
    fingerprinter: &F,
) -> Result<AccuracyReport> {
    config.validate()?;
    let target: Target = config.data.target.parse()?;
    let path = model_path(&config.output.model_dir, target, config.data.with_n);
    let model = ConditionModel::load(&path)?;
    info!("Loaded model from {}", path.display());

    let dataset = prepare_dataset(
        &config.data.path,
        &config.data.file_name,
        config.data.with_n,
        &config.data.target,
        &config.data.recipe,
        fingerprinter,
    )?;
    check_compatible(model.dims(), &dataset)?;
    let (_, mut test, _) = loaders(config, dataset);
    AccuracyReport::compute(&model, &mut test)
}

/// A saved model only scores data assembled with its own recipe, vocabulary
/// and a template range it has seen.
fn check_compatible(dims: &ModelDims, dataset: &AssembledDataset) -> Result<()> {
    if dims.input_width != dataset.input_width {
        return Err(Error::InvalidConfig(format!(
            "model expects {} input features, recipe produces {}",
            dims.input_width, dataset.input_width
        )));
    }
    if dims.num_classes != dataset.vocabulary_size {
        return Err(Error::InvalidConfig(format!(
            "model has {} classes, vocabulary has {}",
            dims.num_classes, dataset.vocabulary_size
        )));
    }
    if dims.kind.uses_template() && dims.template_space < dataset.template_space {
        return Err(Error::InvalidConfig(format!(
            "model covers {} templates, data needs {}",
            dims.template_space, dataset.template_space
        )));
    }
    Ok(())
}

fn loaders(config: &Config, dataset: AssembledDataset) -> (DataLoader, DataLoader, DatasetShape) {
    let shape = DatasetShape::for_model(config.model.kind, dataset.template_space);
    let mut rng = make_rng(config.training.seed);
    let (train, test) = train_test_split(dataset.examples, config.training.test_fraction, &mut rng);
    info!("Train: {} | Test: {}", train.len(), test.len());

    let batch_size = config.training.batch_size;
    let train = DataLoader::new(
        train,
        batch_size,
        Shuffle::EveryPass,
        StdRng::seed_from_u64(rng.gen()),
    );
    let test = DataLoader::new(
        test,
        batch_size,
        Shuffle::Once,
        StdRng::seed_from_u64(rng.gen()),
    );
    (train, test, shape)
}
