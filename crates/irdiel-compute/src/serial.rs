//! Single-threaded backend.

use ndarray::Array3;
use num_complex::Complex64;

use crate::backend::{stack_tensors, BackendType, ComputeBackend, ComputeError, DeviceInfo, Tensor3x3};

/// Evaluates samples one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn parallel_tensor_fill(
        &self,
        samples: usize,
        fill_fn: &(dyn Fn(usize) -> Tensor3x3 + Send + Sync),
    ) -> Result<Array3<Complex64>, ComputeError> {
        stack_tensors((0..samples).map(fill_fn).collect())
    }
}
