//! CLI command implementations.

mod device;
pub mod inspect;
pub mod score;
pub mod train;

pub use device::init_device;

/// Backend used for inference.
pub type InferenceBackend = burn::backend::NdArray;

/// Training requires the Autodiff wrapper for automatic differentiation.
pub type TrainBackend = burn::backend::Autodiff<InferenceBackend>;
