//! ML model crate for credit default prediction.
//!
//! This crate uses the Burn deep learning framework to define, train,
//! and run inference with a feed-forward network that predicts the
//! probability that a loan defaults. It also holds the preprocessing
//! fitted around the network (standard scaler, optional principal
//! component projection) and the artifact bundle that persists all of
//! them as one versioned unit.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

mod bundle;
mod dataset;
mod error;
mod evaluation;
mod projection;
mod scaler;
pub mod training;

pub use bundle::*;
pub use dataset::*;
pub use error::*;
pub use evaluation::*;
pub use projection::*;
pub use scaler::*;
pub use training::{TrainingOutput, train};

/// Configuration for the credit default model.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Width of the input feature vector.
    pub input_size: usize,
    /// Number of hidden units in the first layer.
    #[config(default = 64)]
    pub hidden_size_1: usize,
    /// Number of hidden units in the second layer.
    #[config(default = 32)]
    pub hidden_size_2: usize,
}

impl ModelConfig {
    /// Creates a freshly initialised model on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CreditModel<B> {
        CreditModel::new(device, self)
    }
}

/// Configuration for training the model.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Model architecture configuration.
    pub model: ModelConfig,
    /// Learning rate for the Adam optimizer.
    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
    /// Maximum number of training epochs.
    #[config(default = 100)]
    pub epochs: usize,
    /// Batch size for training.
    #[config(default = 32)]
    pub batch_size: usize,
    /// Trailing fraction of the training rows held out for early stopping.
    #[config(default = 0.2)]
    pub validation_split: f64,
    /// Epochs without validation improvement before training stops.
    #[config(default = 10)]
    pub patience: usize,
    /// Seed for weight initialisation and batch shuffling.
    #[config(default = 42)]
    pub seed: u64,
}

/// The credit default model.
///
/// Two ReLU hidden layers followed by a single sigmoid unit that outputs
/// the probability of default.
#[derive(Module, Debug)]
pub struct CreditModel<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
    linear_out: Linear<B>,
    activation: Relu,
}

impl<B: Backend> CreditModel<B> {
    /// Creates a new credit model with the given configuration.
    pub fn new(device: &B::Device, config: &ModelConfig) -> Self {
        let linear1 = LinearConfig::new(config.input_size, config.hidden_size_1).init(device);
        let linear2 = LinearConfig::new(config.hidden_size_1, config.hidden_size_2).init(device);
        let linear_out = LinearConfig::new(config.hidden_size_2, 1).init(device);
        let activation = Relu::new();

        Self {
            linear1,
            linear2,
            linear_out,
            activation,
        }
    }

    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `input_size`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, 1] containing default probabilities.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear1.forward(input);
        let x = self.activation.forward(x);
        let x = self.linear2.forward(x);
        let x = self.activation.forward(x);
        sigmoid(self.linear_out.forward(x))
    }

    /// Width of the input feature vector the model was built for.
    pub fn input_size(&self) -> usize {
        let [d_input, _] = self.linear1.weight.dims();
        d_input
    }
}

/// Predicts default probabilities for a batch of already-transformed rows.
///
/// # Errors
///
/// Returns [`TransformError::Width`] if any row does not match the model's
/// input width.
pub fn predict_proba<B: Backend>(
    model: &CreditModel<B>,
    rows: &[Vec<f64>],
    device: &B::Device,
) -> Result<Vec<f32>, TransformError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let width = model.input_size();
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        if row.len() != width {
            return Err(TransformError::Width {
                stage: "model",
                expected: width,
                actual: row.len(),
            });
        }
        flat.extend(row.iter().map(|&v| v as f32));
    }

    let input = Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows.len(), width]);
    let output = model.forward(input);

    output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TransformError::Tensor(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_model_creation() {
        let device = Default::default();
        let config = ModelConfig::new(13);
        let model: CreditModel<TestBackend> = config.init(&device);
        assert_eq!(model.input_size(), 13);
    }

    #[test]
    fn test_predictions_are_probabilities() {
        let device = Default::default();
        let model: CreditModel<TestBackend> = ModelConfig::new(4).init(&device);

        let rows = vec![vec![0.0, 1.0, -1.0, 2.0], vec![10.0, -10.0, 5.0, 0.5]];
        let probabilities = predict_proba(&model, &rows, &device).expect("prediction");

        assert_eq!(probabilities.len(), 2);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_prediction_width_mismatch() {
        let device = Default::default();
        let model: CreditModel<TestBackend> = ModelConfig::new(4).init(&device);

        let err = predict_proba(&model, &[vec![1.0, 2.0]], &device).expect_err("wrong width");
        assert!(matches!(
            err,
            TransformError::Width {
                expected: 4,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::new(ModelConfig::new(13));
        assert!(config.learning_rate > 0.0);
        assert_eq!(config.epochs, 100);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.patience, 10);
        assert_eq!(config.model.hidden_size_1, 64);
        assert_eq!(config.model.hidden_size_2, 32);
    }
}
