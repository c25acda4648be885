//! Training logic for the credit default model.

use burn::data::dataset::Dataset;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{CreditBatcher, CreditDataset};
use crate::{CreditModel, TrainingConfig};

/// Probabilities are clamped to `[EPSILON, 1 - EPSILON]` before taking logs.
const BCE_EPSILON: f64 = 1.0e-7;

/// Batch size used when computing the validation loss.
const VALIDATION_BATCH_SIZE: usize = 256;

/// Output from training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutput {
    /// Mean training loss of the last completed epoch.
    pub final_train_loss: f32,
    /// Validation loss of the last completed epoch, if a validation split was used.
    pub final_valid_loss: Option<f32>,
    /// Lowest validation loss seen; the returned weights are from this epoch.
    pub best_valid_loss: Option<f32>,
    /// One-based epoch at which the best validation loss was reached.
    pub best_epoch: Option<usize>,
    /// Number of epochs completed.
    pub epochs_completed: usize,
    /// Whether training stopped before `epochs` because validation stalled.
    pub stopped_early: bool,
}

/// Mean binary cross-entropy between predicted probabilities and 0/1 targets.
pub fn binary_cross_entropy<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let p = predictions.clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);

    let positive = targets.clone() * p.clone().log();
    let negative = targets.neg().add_scalar(1.0) * p.neg().add_scalar(1.0).log();

    (positive + negative).neg().mean()
}

/// Trains the model on the provided dataset.
///
/// The trailing `validation_split` fraction of the dataset is held out for
/// early stopping. Training batches are reshuffled every epoch with a
/// generator seeded from `config.seed`. When validation is used the model is
/// left holding the weights of the epoch with the lowest validation loss.
///
/// # Arguments
///
/// * `model` - The model to train (will be modified in place).
/// * `dataset` - Transformed training rows and labels.
/// * `config` - Training configuration.
///
/// # Errors
///
/// Returns an error if the dataset is empty, its width does not match the
/// model, or a loss value cannot be read back from the backend.
pub fn train<B: AutodiffBackend>(
    model: &mut CreditModel<B>,
    dataset: &CreditDataset,
    config: &TrainingConfig,
) -> anyhow::Result<TrainingOutput> {
    if dataset.is_empty() {
        anyhow::bail!("No training data provided");
    }
    if config.batch_size == 0 {
        anyhow::bail!("Batch size must be positive");
    }

    let width = dataset.width();
    if width != model.input_size() {
        anyhow::bail!(
            "Training rows have {width} features but the model expects {}",
            model.input_size()
        );
    }

    let device = model.linear1.weight.device();

    let (train_set, valid_set) = dataset.split_tail(config.validation_split);
    let valid_set = (!valid_set.is_empty()).then_some(valid_set);

    info!(
        train = train_set.len(),
        valid = valid_set.as_ref().map_or(0, |v| v.len()),
        epochs = config.epochs,
        batch_size = config.batch_size,
        learning_rate = config.learning_rate,
        "Starting training"
    );

    let batcher = CreditBatcher::<B>::new(device, width);
    let mut optimizer = AdamConfig::new().init::<B, CreditModel<B>>();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut final_train_loss = 0.0;
    let mut final_valid_loss: Option<f32> = None;
    let mut best: Option<(f32, usize, CreditModel<B>)> = None;
    let mut epochs_without_improvement = 0;
    let mut epochs_completed = 0;
    let mut stopped_early = false;

    let mut indices: Vec<usize> = (0..train_set.len()).collect();

    for epoch in 1..=config.epochs {
        indices.shuffle(&mut rng);

        let mut epoch_loss = 0.0;
        let mut batch_count: u32 = 0;

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<_> = chunk.iter().filter_map(|&i| train_set.get(i)).collect();
            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items);
            let predictions = model.forward(batch.inputs);
            let loss = binary_cross_entropy(predictions, batch.targets);

            epoch_loss += f64::from(scalar(loss.clone())?);
            batch_count += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);
            *model = optimizer.step(config.learning_rate, model.clone(), grads);
        }

        final_train_loss = if batch_count > 0 {
            (epoch_loss / f64::from(batch_count)) as f32
        } else {
            0.0
        };
        epochs_completed = epoch;

        let Some(valid) = &valid_set else {
            log_progress(epoch, config.epochs, final_train_loss, None);
            continue;
        };

        let valid_loss = validation_loss(model, valid, &batcher)?;
        final_valid_loss = Some(valid_loss);
        log_progress(epoch, config.epochs, final_train_loss, final_valid_loss);

        if best.as_ref().is_none_or(|(best_loss, _, _)| valid_loss < *best_loss) {
            best = Some((valid_loss, epoch, model.clone()));
            epochs_without_improvement = 0;
        } else {
            epochs_without_improvement += 1;
            if epochs_without_improvement >= config.patience {
                info!(
                    epoch,
                    patience = config.patience,
                    "Early stopping triggered: validation loss stopped improving"
                );
                stopped_early = true;
                break;
            }
        }
    }

    let (best_valid_loss, best_epoch) = match best {
        Some((loss, epoch, best_model)) => {
            if epoch != epochs_completed {
                debug!(best_epoch = epoch, "Restoring best weights");
            }
            *model = best_model;
            (Some(loss), Some(epoch))
        }
        None => (None, None),
    };

    Ok(TrainingOutput {
        final_train_loss,
        final_valid_loss,
        best_valid_loss,
        best_epoch,
        epochs_completed,
        stopped_early,
    })
}

/// Computes the mean validation loss over a dataset, weighted by batch size.
fn validation_loss<B: Backend>(
    model: &CreditModel<B>,
    dataset: &CreditDataset,
    batcher: &CreditBatcher<B>,
) -> anyhow::Result<f32> {
    let num_samples = dataset.len();
    if num_samples == 0 {
        return Ok(0.0);
    }

    let mut total_loss = 0.0;
    for batch_start in (0..num_samples).step_by(VALIDATION_BATCH_SIZE) {
        let batch_end = (batch_start + VALIDATION_BATCH_SIZE).min(num_samples);
        let items: Vec<_> = (batch_start..batch_end).filter_map(|i| dataset.get(i)).collect();
        let count = items.len();
        if count == 0 {
            continue;
        }

        let batch = batcher.batch(items);
        let predictions = model.forward(batch.inputs);
        let loss = scalar(binary_cross_entropy(predictions, batch.targets))?;
        total_loss += f64::from(loss) * count as f64;
    }

    Ok((total_loss / num_samples as f64) as f32)
}

/// Reads a single-element loss tensor back to the host.
fn scalar<B: Backend>(loss: Tensor<B, 1>) -> anyhow::Result<f32> {
    let values = loss
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read loss value: {e:?}"))?;
    values
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Loss tensor is empty"))
}

fn log_progress(epoch: usize, epochs: usize, train_loss: f32, valid_loss: Option<f32>) {
    if epoch % 10 == 1 || epoch == epochs {
        info!(epoch, train_loss, valid_loss, "Training progress");
    } else {
        debug!(epoch, train_loss, valid_loss, "Training progress");
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};

    use super::*;
    use crate::{ModelConfig, predict_proba};

    type TestBackend = Autodiff<NdArray>;

    /// Two well-separated clusters: label 1 iff the first feature is positive.
    fn separable(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let positive = i % 2 == 0;
            let offset = (i % 7) as f64 * 0.05;
            let x = if positive { 1.0 + offset } else { -1.0 - offset };
            rows.push(vec![x, 0.5 * x, -offset]);
            labels.push(u8::from(positive));
        }
        (rows, labels)
    }

    #[test]
    fn test_binary_cross_entropy() {
        let device = NdArrayDevice::default();
        let predictions = Tensor::<NdArray, 1>::from_floats([0.9, 0.2], &device).reshape([2, 1]);
        let targets = Tensor::<NdArray, 1>::from_floats([1.0, 0.0], &device).reshape([2, 1]);

        let loss = scalar(binary_cross_entropy(predictions, targets)).expect("loss");
        let expected = -((0.9f32).ln() + (0.8f32).ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5, "loss {loss} expected {expected}");
    }

    #[test]
    fn test_binary_cross_entropy_is_finite_at_extremes() {
        let device = NdArrayDevice::default();
        let predictions = Tensor::<NdArray, 1>::from_floats([0.0, 1.0], &device).reshape([2, 1]);
        let targets = Tensor::<NdArray, 1>::from_floats([1.0, 0.0], &device).reshape([2, 1]);

        let loss = scalar(binary_cross_entropy(predictions, targets)).expect("loss");
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn test_training_learns_separable_data() {
        let device = NdArrayDevice::default();
        let model_config = ModelConfig::new(3);
        let mut model: CreditModel<TestBackend> = model_config.init(&device);

        let (rows, labels) = separable(200);
        let dataset = CreditDataset::new(&rows, &labels);

        let config = TrainingConfig::new(model_config)
            .with_epochs(30)
            .with_batch_size(16)
            .with_learning_rate(1.0e-2);

        let output = train(&mut model, &dataset, &config).expect("training succeeds");
        assert!(output.epochs_completed >= 1);
        assert!(output.best_valid_loss.is_some());

        let probabilities = predict_proba(&model, &[vec![1.2, 0.6, 0.0], vec![-1.2, -0.6, 0.0]], &device)
            .expect("prediction");
        assert!(probabilities[0] > probabilities[1]);
    }

    #[test]
    fn test_early_stopping_terminates() {
        let device = NdArrayDevice::default();
        let model_config = ModelConfig::new(3);
        let mut model: CreditModel<TestBackend> = model_config.init(&device);

        // Labels carry no signal, so validation loss soon stops improving.
        let rows: Vec<Vec<f64>> = (0..60).map(|i| vec![(i % 5) as f64, 1.0, 0.0]).collect();
        let labels: Vec<u8> = (0..60).map(|i| u8::from((i * 7919) % 13 < 6)).collect();
        let dataset = CreditDataset::new(&rows, &labels);

        let config = TrainingConfig::new(model_config)
            .with_epochs(500)
            .with_batch_size(8)
            .with_learning_rate(5.0e-2)
            .with_patience(2);

        let output = train(&mut model, &dataset, &config).expect("training succeeds");
        assert!(output.stopped_early);
        assert!(output.epochs_completed < 500);

        let best_epoch = output.best_epoch.expect("best epoch recorded");
        assert_eq!(output.epochs_completed, best_epoch + 2);
        assert!(output.best_valid_loss <= output.final_valid_loss);
    }

    #[test]
    fn test_no_validation_split() {
        let device = NdArrayDevice::default();
        let model_config = ModelConfig::new(3);
        let mut model: CreditModel<TestBackend> = model_config.init(&device);

        let (rows, labels) = separable(20);
        let dataset = CreditDataset::new(&rows, &labels);
        let config = TrainingConfig::new(model_config)
            .with_epochs(2)
            .with_validation_split(0.0);

        let output = train(&mut model, &dataset, &config).expect("training succeeds");
        assert_eq!(output.epochs_completed, 2);
        assert!(output.final_valid_loss.is_none());
        assert!(!output.stopped_early);
    }

    #[test]
    fn test_rejects_empty_and_mismatched() {
        let device = NdArrayDevice::default();
        let model_config = ModelConfig::new(3);
        let mut model: CreditModel<TestBackend> = model_config.init(&device);
        let config = TrainingConfig::new(model_config);

        let empty = CreditDataset::new(&[], &[]);
        assert!(train(&mut model, &empty, &config).is_err());

        let narrow = CreditDataset::new(&[vec![1.0, 2.0]], &[1]);
        assert!(train(&mut model, &narrow, &config).is_err());
    }
}
