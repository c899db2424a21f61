//! CPU compute backend using Rayon for shared-memory parallelism.

use ndarray::Array3;
use num_complex::Complex64;

use crate::backend::{stack_tensors, BackendType, ComputeBackend, ComputeError, DeviceInfo, Tensor3x3};

/// CPU backend that parallelises samples across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
}

impl CpuBackend {
    /// Create a new CPU backend using all available threads.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn parallel_tensor_fill(
        &self,
        samples: usize,
        fill_fn: &(dyn Fn(usize) -> Tensor3x3 + Send + Sync),
    ) -> Result<Array3<Complex64>, ComputeError> {
        use rayon::prelude::*;

        // Indexed collect keeps sample order.
        let tensors: Vec<Tensor3x3> = (0..samples).into_par_iter().map(fill_fn).collect();
        stack_tensors(tensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SerialBackend;

    #[test]
    fn test_matches_serial_backend() {
        let fill = |k: usize| {
            let w = k as f64 * 0.01;
            let mut t = [[Complex64::new(0.0, 0.0); 3]; 3];
            for (i, row) in t.iter_mut().enumerate() {
                for (j, v) in row.iter_mut().enumerate() {
                    *v = Complex64::new(1.0, 0.0) / Complex64::new(1.0 + (i + j) as f64 - w * w, -0.1);
                }
            }
            t
        };

        let serial = SerialBackend.parallel_tensor_fill(257, &fill).unwrap();
        let cpu = CpuBackend::new().parallel_tensor_fill(257, &fill).unwrap();
        assert_eq!(serial, cpu);
    }

    #[test]
    fn test_device_info() {
        let info = CpuBackend::new().device_info();
        assert_eq!(info.backend_type, BackendType::Cpu);
        assert!(info.compute_units.unwrap_or(0) >= 1);
    }
}
