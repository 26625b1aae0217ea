use anyhow::{Context, Result};
use carprice::application::ml::dataset::{DEFAULT_REFERENCE_YEAR, PreprocessOptions};
use carprice::application::ml::training::{self, TrainingJob, TrainingParams};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fit the used-car price pipeline", long_about = None)]
struct Args {
    /// Path to the listings CSV
    #[arg(long, default_value = "data/car-details.csv")]
    input: PathBuf,

    /// Path to output model file
    #[arg(long, default_value = "models/rf_model.json")]
    output: PathBuf,

    /// Number of trees in the random forest
    #[arg(long, default_value_t = 100)]
    n_estimators: usize,

    /// Maximum depth of trees (unbounded when omitted)
    #[arg(long)]
    max_depth: Option<u16>,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 2)]
    min_split: usize,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.3)]
    test_size: f64,

    /// Seed for the train/test shuffle and the forest
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Year that vehicle age is computed against
    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    reference_year: i64,

    /// Disable train/test split (train on 100% of data). Use after validation.
    #[arg(long)]
    no_split: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let job = TrainingJob {
        input: args.input,
        output: args.output,
        params: TrainingParams {
            n_estimators: args.n_estimators,
            max_depth: args.max_depth,
            min_samples_split: args.min_split,
            seed: args.seed,
        },
        preprocess: PreprocessOptions {
            reference_year: args.reference_year,
        },
        test_fraction: if args.no_split { 0.0 } else { args.test_size },
    };

    let outcome = training::run(&job).context("Training failed")?;

    match outcome.evaluation {
        Some(report) => println!(
            "RMSE: {:.2} MAD | MAE: {:.2} MAD | R2: {:.3} (n={})",
            report.rmse, report.mae, report.r2, report.n_samples
        ),
        None => println!("No held-out split; skipped evaluation."),
    }
    println!(
        "Model (trained on {} samples) saved to {:?}.",
        outcome.n_train, outcome.output
    );
    Ok(())
}
