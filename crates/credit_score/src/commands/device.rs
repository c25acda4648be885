use burn::backend::ndarray::NdArrayDevice;
use tracing::debug;

/// Initializes the CPU device the model runs on.
///
/// This function only exists to be able to change the device at a single location.
pub fn init_device() -> NdArrayDevice {
    debug!("Initializing ndarray CPU device...");
    NdArrayDevice::default()
}
