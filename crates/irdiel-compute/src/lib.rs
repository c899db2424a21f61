//! # IRDiel Compute
//!
//! Compute backend abstraction for the IRDiel workspace. Spectrum evaluation
//! in `irdiel-core` hands each frequency sample to a
//! [`ComputeBackend`](backend::ComputeBackend), which decides how the
//! independent samples are scheduled.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Notes |
//! |---------|-------------|-------|
//! | Serial | always | Single thread, in sample order |
//! | CPU (Rayon) | `cpu` (default) | Work-stealing over samples |

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, Tensor3x3};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;

use std::sync::Arc;

/// The backend used when the caller does not choose one.
///
/// Rayon when the `cpu` feature is enabled, serial otherwise.
pub fn default_backend() -> Arc<dyn ComputeBackend> {
    #[cfg(feature = "cpu")]
    {
        Arc::new(CpuBackend::new())
    }
    #[cfg(not(feature = "cpu"))]
    {
        Arc::new(SerialBackend)
    }
}
