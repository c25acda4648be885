//! Train command - fits the preprocessing and the classifier on a loan
//! export and writes an artifact bundle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use feature_extractor::{CategoryUniverse, FeatureSchema, derive_training_set};
use loan_parser::load_loans;
use ml_model::{
    BundleManifest, ClassificationReport, CreditDataset, CreditModel, ModelConfig, ModelShape, PcaProjector,
    StandardScaler, TrainingConfig, TrainingSummary, predict_proba, save_bundle, train,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use super::{TrainBackend, init_device};

/// Fraction of rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

/// Settings for one training run.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub csv: PathBuf,
    pub schema: FeatureSchema,
    pub out: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Principal components to keep; `None` skips the projection.
    pub components: Option<usize>,
    pub threshold: f64,
    pub seed: u64,
}

/// Shuffles `0..len` and splits it into train and test indices.
///
/// The test side gets `ceil(len * test_fraction)` rows, but the train side
/// always keeps at least one.
#[must_use]
pub fn train_test_split(len: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let test_len = ((len as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test_len = test_len.min(len.saturating_sub(1));
    let test = indices.split_off(len - test_len);
    (indices, test)
}

fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if any stage fails; nothing is written in that case.
pub fn run(options: &TrainOptions) -> Result<BundleManifest> {
    info!(
        csv = %options.csv.display(),
        schema = %options.schema,
        out = %options.out.display(),
        "Starting training"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&options.threshold),
        "Decision threshold must lie in [0, 1], got {}",
        options.threshold
    );

    let universe = CategoryUniverse::default();
    let table = load_loans(&options.csv, &options.schema.required_columns())
        .with_context(|| format!("Failed to load {}", options.csv.display()))?;
    let derived = derive_training_set(&table.records, options.schema, &universe)?;

    anyhow::ensure!(
        derived.len() >= 2,
        "Need at least two usable rows to split, got {}",
        derived.len()
    );
    info!(
        rows = derived.len(),
        defaults = derived.positive_count(),
        "Derived features and labels"
    );

    let (train_idx, test_idx) = train_test_split(derived.len(), TEST_FRACTION, options.seed);
    let train_rows = select(&derived.features, &train_idx);
    let test_rows = select(&derived.features, &test_idx);
    let train_labels = select(&derived.labels, &train_idx);
    let test_labels = select(&derived.labels, &test_idx);

    let scaler = StandardScaler::fit(&train_rows).context("Failed to fit scaler")?;
    let mut train_x = scaler.transform(&train_rows)?;
    let mut test_x = scaler.transform(&test_rows)?;

    let projector = match options.components {
        Some(k) => {
            let projector = PcaProjector::fit(&train_x, k).context("Failed to fit projection")?;
            train_x = projector.transform(&train_x)?;
            test_x = projector.transform(&test_x)?;
            info!(
                components = k,
                explained_variance = projector.explained_variance.iter().sum::<f64>(),
                "Fitted principal component projection"
            );
            Some(projector)
        }
        None => None,
    };

    let input_size = projector.as_ref().map_or(scaler.width(), PcaProjector::output_width);
    let model_config = ModelConfig::new(input_size);
    let config = TrainingConfig::new(model_config.clone())
        .with_epochs(options.epochs)
        .with_batch_size(options.batch_size)
        .with_learning_rate(options.learning_rate)
        .with_seed(options.seed);

    let device = init_device();
    let mut model: CreditModel<TrainBackend> = model_config.init(&device);
    let dataset = CreditDataset::new(&train_x, &train_labels);
    let output = train(&mut model, &dataset, &config)?;

    let model = model.valid();
    let probabilities = predict_proba(&model, &test_x, &device)?;
    let evaluation = ClassificationReport::from_probabilities(&test_labels, &probabilities, options.threshold);

    println!("\nClassification Report:\n{evaluation}");
    info!(
        accuracy = evaluation.accuracy,
        default_recall = evaluation.positive.recall,
        default_precision = evaluation.positive.precision,
        "Evaluated on held-out split"
    );

    let summary = TrainingSummary {
        rows_read: table.len(),
        rows_used: derived.len(),
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        seed: options.seed,
        epochs: options.epochs,
        batch_size: options.batch_size,
        learning_rate: options.learning_rate,
        output,
    };
    let manifest = BundleManifest::new(
        options.schema,
        universe,
        scaler,
        projector,
        ModelShape::from_config(&model_config),
        options.threshold,
        summary,
        evaluation,
    );

    save_bundle(&options.out, &manifest, &model)?;
    info!(
        bundle_id = %manifest.bundle_id,
        out = %options.out.display(),
        "Training complete"
    );
    println!("Bundle saved to: {}", display_dir(&options.out));

    Ok(manifest)
}

fn display_dir(path: &Path) -> String {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf()).display().to_string()
}
