//! Credit default scorecard
//!
//! Command line entry point for training the classifier and scoring loan
//! applications.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use credit_score::commands;
use credit_score::commands::score::ScoreOptions;
use credit_score::commands::train::TrainOptions;
use feature_extractor::FeatureSchema;
use ml_model::DEFAULT_DECISION_THRESHOLD;
use tracing_subscriber::EnvFilter;

/// Credit default classifier and risk scorecard
#[derive(Parser)]
#[command(name = "credit-score")]
#[command(about = "Train a loan default classifier and score loan applications")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the classifier on a loan CSV export and write an artifact bundle
    Train {
        /// Path to the loan CSV export
        #[arg(long, env = "CREDIT_TRAINING_CSV")]
        csv: Option<PathBuf>,

        /// Feature schema to train with ("raw" or "expanded")
        #[arg(long, default_value = "expanded")]
        schema: FeatureSchema,

        /// Directory to write the bundle to
        #[arg(short, long, env = "CREDIT_ARTIFACT_DIR")]
        out: Option<PathBuf>,

        /// Maximum number of training epochs
        #[arg(short, long, default_value = "100")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Project the scaled features onto this many principal components
        #[arg(long)]
        components: Option<usize>,

        /// Decision threshold stored in the bundle and used for evaluation
        #[arg(long, default_value_t = DEFAULT_DECISION_THRESHOLD)]
        threshold: f64,

        /// Seed for the train/test split and batch shuffling
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Score a loan application with a trained bundle
    Score {
        /// Bundle directory
        #[arg(short, long, env = "CREDIT_ARTIFACT_DIR")]
        bundle: Option<PathBuf>,

        /// JSON file with application fields; missing fields take defaults
        #[arg(short, long)]
        form: Option<PathBuf>,

        /// Override a field, e.g. `--set annual_inc=85000` (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,

        /// Prompt for every field
        #[arg(short, long)]
        interactive: bool,

        /// Decision threshold overriding the bundle's
        #[arg(long, env = "CREDIT_DECISION_THRESHOLD")]
        threshold: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the contents of a bundle
    Inspect {
        /// Bundle directory
        #[arg(short, long, env = "CREDIT_ARTIFACT_DIR")]
        bundle: Option<PathBuf>,

        /// Print the full manifest as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Train {
            csv,
            schema,
            out,
            epochs,
            batch_size,
            learning_rate,
            components,
            threshold,
            seed,
        } => commands::train::run(&TrainOptions {
            csv: csv.unwrap_or(config.training_csv),
            schema,
            out: out.unwrap_or(config.artifact_dir),
            epochs,
            batch_size,
            learning_rate,
            components,
            threshold,
            seed,
        })
        .map(drop),
        Commands::Score {
            bundle,
            form,
            overrides,
            interactive,
            threshold,
            json,
        } => commands::score::run(&ScoreOptions {
            bundle: bundle.unwrap_or(config.artifact_dir),
            form,
            overrides,
            interactive,
            threshold: threshold.or(config.decision_threshold),
            json,
        })
        .map(drop),
        Commands::Inspect { bundle, json } => {
            commands::inspect::run(&bundle.unwrap_or(config.artifact_dir), json).map(drop)
        }
    }
}
