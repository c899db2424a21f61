//! Compute backend trait and device description.
//!
//! The [`ComputeBackend`] trait keeps the physics code in `irdiel-core`
//! independent of how the per-frequency work is scheduled.

use ndarray::Array3;
use num_complex::Complex64;
use thiserror::Error;

/// A single 3x3 complex tensor, row-major.
pub type Tensor3x3 = [[Complex64; 3]; 3];

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    DeviceError(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// Abstraction over compute backends.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Evaluate `fill_fn` for every sample index in `0..samples` and stack
    /// the resulting tensors into an array of shape `(samples, 3, 3)`.
    ///
    /// Samples must be independent of each other. The output is always in
    /// sample order, whatever order the backend evaluates them in.
    fn parallel_tensor_fill(
        &self,
        samples: usize,
        fill_fn: &(dyn Fn(usize) -> Tensor3x3 + Send + Sync),
    ) -> Result<Array3<Complex64>, ComputeError>;
}

/// Flatten a list of 3x3 tensors into a `(n, 3, 3)` array.
pub(crate) fn stack_tensors(tensors: Vec<Tensor3x3>) -> Result<Array3<Complex64>, ComputeError> {
    let n = tensors.len();
    let flat: Vec<Complex64> = tensors
        .into_iter()
        .flat_map(|t| t.into_iter().flatten())
        .collect();
    Array3::from_shape_vec((n, 3, 3), flat).map_err(|e| ComputeError::DeviceError(e.to_string()))
}
