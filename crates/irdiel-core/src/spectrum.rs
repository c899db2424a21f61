//! Spectrum generation.
//!
//! Turns a [`DielectricModel`] into the complex dielectric tensor sampled on a
//! uniform frequency grid. Every optical mode $m \ge 3$ contributes a damped
//! Lorentz oscillator:
//!
//! $$\epsilon(\omega) = \epsilon_\infty + \sum_{m \ge 3}
//!   \frac{S_m}{\omega_m^2 - \omega^2 - i\,\gamma_m}, \qquad
//!   \gamma_m = b_m\,\omega_m$$
//!
//! where $b_m$ is the relative broadening of mode $m$. Samples are independent
//! and are handed to a [`ComputeBackend`] for scheduling.

use std::sync::Arc;

use irdiel_compute::{default_backend, ComputeBackend, Tensor3x3};
use log::debug;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{ACOUSTIC_MODES, AUTO_RANGE_BROADENINGS, DEFAULT_BROADENING, DEFAULT_DIVISIONS};
use crate::error::DielectricError;
use crate::model::DielectricModel;
use crate::types::SampledTensorField;

/// Per-mode damping policy.
///
/// Deserializes from either a bare number or a list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Broadening {
    /// The same relative broadening for every mode.
    Uniform(f64),
    /// One relative broadening per mode, acoustic modes included.
    PerMode(Vec<f64>),
}

impl Default for Broadening {
    fn default() -> Self {
        Broadening::Uniform(DEFAULT_BROADENING)
    }
}

impl From<f64> for Broadening {
    fn from(b: f64) -> Self {
        Broadening::Uniform(b)
    }
}

impl From<Vec<f64>> for Broadening {
    fn from(b: Vec<f64>) -> Self {
        Broadening::PerMode(b)
    }
}

impl Broadening {
    /// Expand into one value per mode.
    ///
    /// # Errors
    /// [`DielectricError::BroadeningLengthMismatch`] if a per-mode list has the
    /// wrong length, [`DielectricError::InvalidBroadening`] for a negative or
    /// non-finite value.
    pub fn resolve(&self, mode_count: usize) -> Result<Vec<f64>, DielectricError> {
        let values = match self {
            Broadening::Uniform(b) => vec![*b; mode_count],
            Broadening::PerMode(list) => {
                if list.len() != mode_count {
                    return Err(DielectricError::BroadeningLengthMismatch {
                        expected: mode_count,
                        found: list.len(),
                    });
                }
                list.clone()
            }
        };
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, b)| !b.is_finite() || **b < 0.0)
        {
            return Err(DielectricError::InvalidBroadening { index, value });
        }
        Ok(values)
    }
}

/// Grid and damping parameters for one spectrum evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumParams {
    pub broadening: Broadening,
    /// Lower grid bound (eV).
    pub freq_min: f64,
    /// Upper grid bound (eV). When `None`, the grid extends
    /// [`AUTO_RANGE_BROADENINGS`] times the largest broadening past the
    /// highest phonon frequency.
    pub freq_max: Option<f64>,
    /// Number of samples, both bounds included.
    pub divisions: usize,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            broadening: Broadening::default(),
            freq_min: 0.0,
            freq_max: None,
            divisions: DEFAULT_DIVISIONS,
        }
    }
}

/// Evaluates the Lorentz-oscillator sum on a compute backend.
pub struct SpectrumSolver {
    pub backend: Arc<dyn ComputeBackend>,
}

impl Default for SpectrumSolver {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl SpectrumSolver {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    /// Sample $\epsilon(\omega)$ on the grid described by `params`.
    ///
    /// # Arguments
    /// * `model` - Phonon inputs.
    /// * `params` - Broadening policy and grid.
    ///
    /// # Errors
    /// Broadening errors from [`Broadening::resolve`],
    /// [`DielectricError::InvalidGrid`] for non-finite or reversed bounds, and
    /// [`DielectricError::Compute`] if the backend fails.
    pub fn compute_spectrum(
        &self,
        model: &DielectricModel,
        params: &SpectrumParams,
    ) -> Result<SampledTensorField, DielectricError> {
        let broadening = params.broadening.resolve(model.mode_count())?;

        let freq_min = params.freq_min;
        let freq_max = match params.freq_max {
            Some(f) => f,
            None => {
                let b_max = broadening.iter().copied().fold(0.0, f64::max);
                // Acoustic-only models may have a slightly negative maximum.
                model.max_frequency().max(0.0) + AUTO_RANGE_BROADENINGS * b_max
            }
        };
        if !freq_min.is_finite() || !freq_max.is_finite() || freq_max < freq_min {
            return Err(DielectricError::InvalidGrid { freq_min, freq_max });
        }

        let frequencies = linspace(freq_min, freq_max, params.divisions);
        debug!(
            "Sampling {} points in [{:.6}, {:.6}] eV on {}",
            frequencies.len(),
            freq_min,
            freq_max,
            self.backend.device_info().name
        );

        let oscillators = OpticalOscillators::new(model, &broadening);
        let grid = frequencies.as_slice().unwrap_or_default();
        let tensors = self
            .backend
            .parallel_tensor_fill(grid.len(), &|k| oscillators.tensor_at(grid[k]))?;

        Ok(SampledTensorField {
            frequencies,
            tensors,
        })
    }
}

/// Sample $\epsilon(\omega)$ with the default backend.
pub fn compute_spectrum(
    model: &DielectricModel,
    params: &SpectrumParams,
) -> Result<SampledTensorField, DielectricError> {
    SpectrumSolver::default().compute_spectrum(model, params)
}

/// The optical modes of a model flattened for the inner loop.
///
/// Modes past the end of `broadening` are treated as undamped.
struct OpticalOscillators {
    background: [[f64; 3]; 3],
    /// `(omega_m^2, gamma_m, S_m)` per optical mode.
    modes: Vec<(f64, f64, [[f64; 3]; 3])>,
}

impl OpticalOscillators {
    fn new(model: &DielectricModel, broadening: &[f64]) -> Self {
        let eps_inf = model.epsilon_infinity();
        let mut background = [[0.0; 3]; 3];
        for (i, row) in background.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = eps_inf[[i, j]];
            }
        }

        let modes = model
            .modes()
            .skip(ACOUSTIC_MODES)
            .map(|mode| {
                let b = broadening.get(mode.index).copied().unwrap_or(0.0);
                let s = &mode.oscillator_strength;
                let mut strength = [[0.0; 3]; 3];
                for (i, row) in strength.iter_mut().enumerate() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = s[[i, j]];
                    }
                }
                (mode.frequency * mode.frequency, b * mode.frequency, strength)
            })
            .collect();

        Self { background, modes }
    }

    fn tensor_at(&self, omega: f64) -> Tensor3x3 {
        let mut eps = [[Complex64::new(0.0, 0.0); 3]; 3];
        for &(f2, gamma, ref s) in &self.modes {
            let inv = Complex64::new(f2 - omega * omega, -gamma).inv();
            for i in 0..3 {
                for j in 0..3 {
                    eps[i][j] += inv * s[i][j];
                }
            }
        }
        for i in 0..3 {
            for j in 0..3 {
                eps[i][j] += self.background[i][j];
            }
        }
        eps
    }
}

/// `n` evenly spaced points from `start` to `stop`, both included.
fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut grid = Array1::from_shape_fn(n, |k| start + step * k as f64);
            grid[n - 1] = stop;
            grid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use irdiel_compute::SerialBackend;
    use irdiel_structure::{Lattice, Site, Structure};
    use ndarray::{arr1, Array2, Array3};

    fn model(freqs: &[f64]) -> DielectricModel {
        let n = freqs.len();
        let mut s = Array3::<f64>::zeros((n, 3, 3));
        for m in ACOUSTIC_MODES..n {
            for i in 0..3 {
                s[[m, i, i]] = 5.0;
            }
        }
        let structure = Structure::new(
            Lattice::cubic(4.0).unwrap(),
            vec![Site::new("Mg", [0.0; 3]), Site::new("O", [0.5; 3])],
        )
        .unwrap();
        DielectricModel::from_real(s, arr1(freqs), Array2::eye(3) * 2.0, structure).unwrap()
    }

    fn serial() -> SpectrumSolver {
        SpectrumSolver::new(Arc::new(SerialBackend))
    }

    #[test]
    fn test_linspace_inclusive() {
        let g = linspace(0.0, 5.0, 5);
        assert_eq!(g.to_vec(), vec![0.0, 1.25, 2.5, 3.75, 5.0]);
        assert_eq!(linspace(1.0, 2.0, 1).to_vec(), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_resolve_uniform() {
        assert_eq!(Broadening::Uniform(0.1).resolve(3).unwrap(), vec![0.1; 3]);
    }

    #[test]
    fn test_resolve_length_mismatch() {
        let err = Broadening::PerMode(vec![0.1; 4]).resolve(5);
        assert!(matches!(
            err,
            Err(DielectricError::BroadeningLengthMismatch { expected: 5, found: 4 })
        ));
    }

    #[test]
    fn test_resolve_negative() {
        let err = Broadening::PerMode(vec![0.1, -0.1]).resolve(2);
        assert!(matches!(err, Err(DielectricError::InvalidBroadening { index: 1, .. })));
    }

    #[test]
    fn test_broadening_deserializes_untagged() {
        let b: Broadening = serde_json::from_str("0.2").unwrap();
        assert_eq!(b, Broadening::Uniform(0.2));
        let b: Broadening = serde_json::from_str("[0.1, 0.2]").unwrap();
        assert_eq!(b, Broadening::PerMode(vec![0.1, 0.2]));
    }

    #[test]
    fn test_lorentz_sum_at_zero() {
        let m = model(&[0.0, 0.0, 0.0, 10.0, 20.0]);
        let eps = OpticalOscillators::new(&m, &[0.1; 5]).tensor_at(0.0);
        let expected = Complex64::new(2.0, 0.0)
            + Complex64::new(5.0, 0.0) / Complex64::new(100.0, -1.0)
            + Complex64::new(5.0, 0.0) / Complex64::new(400.0, -2.0);
        assert_relative_eq!(eps[0][0].re, expected.re, epsilon = 1e-12);
        assert_relative_eq!(eps[0][0].im, expected.im, epsilon = 1e-12);
        assert_eq!(eps[0][1], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_auto_upper_bound() {
        let m = model(&[0.0, 0.0, 0.0, 0.02, 0.05]);
        let params = SpectrumParams {
            broadening: Broadening::PerMode(vec![0.0, 0.0, 0.0, 0.001, 0.002]),
            divisions: 11,
            ..SpectrumParams::default()
        };
        let field = serial().compute_spectrum(&m, &params).unwrap();
        assert_eq!(field.len(), 11);
        assert_relative_eq!(field.frequencies[10], 0.05 + 20.0 * 0.002, epsilon = 1e-15);
    }

    #[test]
    fn test_auto_upper_bound_with_noisy_acoustic_modes() {
        let m = model(&[-1e-3, -2e-3, -1e-3]);
        let params = SpectrumParams {
            broadening: Broadening::Uniform(1e-4),
            divisions: 3,
            ..SpectrumParams::default()
        };
        let field = serial().compute_spectrum(&m, &params).unwrap();
        assert_relative_eq!(field.frequencies[2], 20.0 * 1e-4, epsilon = 1e-15);
    }

    #[test]
    fn test_reversed_grid_rejected() {
        let m = model(&[0.0, 0.0, 0.0, 0.02]);
        let params = SpectrumParams {
            freq_min: 1.0,
            freq_max: Some(0.5),
            ..SpectrumParams::default()
        };
        assert!(matches!(
            serial().compute_spectrum(&m, &params),
            Err(DielectricError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_fewer_than_three_modes_gives_background() {
        let m = model(&[0.0, 0.0]);
        let params = SpectrumParams {
            freq_max: Some(1.0),
            divisions: 4,
            ..SpectrumParams::default()
        };
        let field = serial().compute_spectrum(&m, &params).unwrap();
        for (_, t) in field.iter() {
            for i in 0..3 {
                for j in 0..3 {
                    let want = if i == j { 2.0 } else { 0.0 };
                    assert_eq!(t[[i, j]], Complex64::new(want, 0.0));
                }
            }
        }
    }

    #[test]
    fn test_zero_divisions() {
        let m = model(&[0.0, 0.0, 0.0, 0.02]);
        let params = SpectrumParams {
            divisions: 0,
            ..SpectrumParams::default()
        };
        let field = serial().compute_spectrum(&m, &params).unwrap();
        assert!(field.is_empty());
        assert_eq!(field.tensors.shape(), &[0, 3, 3]);
    }
}
