use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reactcond::config::{Config, ModelKind};
use reactcond::fingerprint::{Fingerprinter, MorganFingerprinter};
use reactcond::train;

/// Train reaction condition classifiers on Morgan fingerprints
#[derive(Parser, Debug)]
#[command(name = "reactcond", version)]
#[command(about = "Reaction condition prediction from reaction fingerprints", long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model and write its metrics
    Train(RunArgs),
    /// Re-score a saved model on the seeded test partition
    Evaluate(RunArgs),
    /// Print the on-bits of each molecule's fingerprint
    Fingerprint {
        #[arg(required = true)]
        smiles: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Condition to predict: cat, solv, reag0..reag3
    #[arg(short, long)]
    target: Option<String>,

    /// Input blocks, e.g. rfp+pfp+rxnfp+solv
    #[arg(short, long)]
    recipe: Option<String>,

    /// Use the with-nitrogen vocabulary and model name
    #[arg(long)]
    with_n: bool,

    #[arg(short, long)]
    epochs: Option<usize>,

    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModelArg {
    Mlp,
    DropoutMlp,
    TemplateMlp,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Mlp => ModelKind::Mlp,
            ModelArg::DropoutMlp => ModelKind::DropoutMlp,
            ModelArg::TemplateMlp => ModelKind::TemplateMlp,
        }
    }
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(target) = self.target {
            config.data.target = target;
        }
        if let Some(recipe) = self.recipe {
            config.data.recipe = recipe;
        }
        if self.with_n {
            config.data.with_n = true;
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(model) = self.model {
            config.model.kind = model.into();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train(run) => {
            let config = load_config(&args.config, run)?;
            info!(
                "Training {:?} for {} with recipe {}",
                config.model.kind, config.data.target, config.data.recipe
            );
            let outcome = train::run(&config)?;
            info!(
                "acc {:.4} | acc3 {:.4} | acc10 {:.4}",
                outcome.report.acc, outcome.report.acc3, outcome.report.acc10
            );
        }
        Command::Evaluate(run) => {
            let config = load_config(&args.config, run)?;
            let report = train::evaluate_saved(&config, &MorganFingerprinter::default())?;
            println!("acc,acc3,acc10");
            println!("{},{},{}", report.acc, report.acc3, report.acc10);
        }
        Command::Fingerprint { smiles } => {
            let fp = MorganFingerprinter::default();
            for s in smiles {
                let bits = fp
                    .fingerprint(&s)
                    .with_context(|| format!("fingerprinting {s}"))?;
                let on: Vec<String> = bits
                    .as_slice()
                    .iter()
                    .enumerate()
                    .filter(|(_, &b)| b != 0)
                    .map(|(i, _)| i.to_string())
                    .collect();
                println!("{s}\t{}\t{}", bits.count_ones(), on.join(","));
            }
        }
    }

    Ok(())
}

fn load_config(path: &std::path::Path, run: RunArgs) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(path)
        .with_context(|| format!("loading {}", path.display()))?;
    run.apply(&mut config);
    config.validate()?;
    Ok(config)
}
