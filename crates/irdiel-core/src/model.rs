//! The ionic dielectric model.
//!
//! [`DielectricModel`] holds the inputs of the Lorentz-oscillator
//! decomposition of the ionic dielectric response, as defined in Eqs. 53–54 of
//! X. Gonze and C. Lee, *Phys. Rev. B* **55**, 10355 (1997):
//!
//! - the oscillator strength $S_m$ (3x3) of each Γ-point phonon mode $m$,
//! - the mode frequencies $\omega_m$ (eV),
//! - the electronic dielectric tensor $\epsilon_\infty$ (3x3),
//! - the crystal structure the phonons were computed for.
//!
//! The model is immutable once built. Its persisted form is a
//! [`DielectricModelRecord`], written as JSON by [`DielectricModel::save`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use irdiel_structure::{Structure, StructureRecord};
use log::{debug, warn};
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{ACOUSTIC_MODES, IMAG_WARN_TOL};
use crate::error::DielectricError;

/// Type tags written into every model record.
pub const MODEL_MODULE: &str = "irdiel_core::model";
pub const MODEL_CLASS: &str = "IRDielectricTensor";

/// Phonon inputs for the ionic dielectric tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct DielectricModel {
    /// Real oscillator strengths, shape `(N, 3, 3)`.
    oscillator_strength: Array3<f64>,
    /// Γ-point phonon frequencies (eV), shape `(N,)`.
    phfreqs_gamma: Array1<f64>,
    /// Electronic dielectric tensor, shape `(3, 3)`.
    epsilon_infinity: Array2<f64>,
    structure: Structure,
}

/// A borrowed view of one phonon mode.
#[derive(Debug, Clone, Copy)]
pub struct PhononMode<'a> {
    /// Position of the mode in the model.
    pub index: usize,
    /// Frequency (eV).
    pub frequency: f64,
    /// Real 3x3 oscillator strength.
    pub oscillator_strength: ArrayView2<'a, f64>,
}

impl PhononMode<'_> {
    /// Whether this is one of the leading translational modes that never
    /// enter the optical sum.
    #[inline]
    pub fn is_acoustic(&self) -> bool {
        self.index < ACOUSTIC_MODES
    }
}

impl DielectricModel {
    /// Create a model from raw (possibly complex) oscillator strengths.
    ///
    /// The imaginary part of `oscillator_strength` is discarded. If it is
    /// larger than [`IMAG_WARN_TOL`] anywhere, a warning is logged first.
    ///
    /// # Arguments
    /// * `oscillator_strength` - Oscillator strengths, shape `(N, 3, 3)`.
    /// * `phfreqs_gamma` - Γ-point phonon frequencies (eV), length `N`.
    /// * `epsilon_infinity` - Electronic dielectric tensor, shape `(3, 3)`.
    /// * `structure` - Structure the phonons were computed for.
    ///
    /// # Errors
    /// [`DielectricError::ShapeMismatch`] if the shapes disagree, and
    /// [`DielectricError::InvalidFrequency`] for a non-finite frequency or a
    /// negative optical frequency.
    pub fn new(
        oscillator_strength: Array3<Complex64>,
        phfreqs_gamma: Array1<f64>,
        epsilon_infinity: Array2<f64>,
        structure: Structure,
    ) -> Result<Self, DielectricError> {
        let (strength, _) = discard_imaginary(&oscillator_strength);
        Self::from_real(strength, phfreqs_gamma, epsilon_infinity, structure)
    }

    /// Create a model from real oscillator strengths.
    ///
    /// Validation is the same as for [`DielectricModel::new`].
    pub fn from_real(
        oscillator_strength: Array3<f64>,
        phfreqs_gamma: Array1<f64>,
        epsilon_infinity: Array2<f64>,
        structure: Structure,
    ) -> Result<Self, DielectricError> {
        let n = phfreqs_gamma.len();

        if oscillator_strength.shape() != [n, 3, 3] {
            return Err(DielectricError::ShapeMismatch {
                field: "oscillator_strength",
                expected: format!("[{}, 3, 3]", n),
                found: format!("{:?}", oscillator_strength.shape()),
            });
        }
        if epsilon_infinity.shape() != [3, 3] {
            return Err(DielectricError::ShapeMismatch {
                field: "epsilon_infinity",
                expected: "[3, 3]".into(),
                found: format!("{:?}", epsilon_infinity.shape()),
            });
        }

        // Acoustic modes are often slightly negative from numerical noise;
        // they are excluded from the sum so only finiteness is required.
        for (index, &value) in phfreqs_gamma.iter().enumerate() {
            let acoustic = index < ACOUSTIC_MODES;
            if !value.is_finite() || (!acoustic && value < 0.0) {
                return Err(DielectricError::InvalidFrequency { index, value });
            }
            if acoustic && value < 0.0 {
                debug!("Acoustic mode {} has negative frequency {:.3e}", index, value);
            }
        }

        Ok(Self {
            oscillator_strength,
            phfreqs_gamma,
            epsilon_infinity,
            structure,
        })
    }

    /// Highest phonon frequency (eV); `0.0` for a model without modes.
    pub fn max_frequency(&self) -> f64 {
        self.phfreqs_gamma.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Number of phonon modes, including the acoustic ones.
    #[inline]
    pub fn mode_count(&self) -> usize {
        self.phfreqs_gamma.len()
    }

    #[inline]
    pub fn oscillator_strength(&self) -> &Array3<f64> {
        &self.oscillator_strength
    }

    #[inline]
    pub fn phfreqs_gamma(&self) -> &Array1<f64> {
        &self.phfreqs_gamma
    }

    #[inline]
    pub fn epsilon_infinity(&self) -> &Array2<f64> {
        &self.epsilon_infinity
    }

    #[inline]
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Frequencies of the optical modes (all but the first three).
    pub fn optical_frequencies(&self) -> ArrayView1<'_, f64> {
        let start = ACOUSTIC_MODES.min(self.mode_count());
        self.phfreqs_gamma.slice(s![start..])
    }

    /// View of mode `index`, or `None` if out of range.
    pub fn mode(&self, index: usize) -> Option<PhononMode<'_>> {
        (index < self.mode_count()).then(|| PhononMode {
            index,
            frequency: self.phfreqs_gamma[index],
            oscillator_strength: self.oscillator_strength.index_axis(Axis(0), index),
        })
    }

    /// All modes in order.
    pub fn modes(&self) -> impl Iterator<Item = PhononMode<'_>> + '_ {
        self.phfreqs_gamma
            .iter()
            .zip(self.oscillator_strength.axis_iter(Axis(0)))
            .enumerate()
            .map(|(index, (&frequency, oscillator_strength))| PhononMode {
                index,
                frequency,
                oscillator_strength,
            })
    }

    /// Static (ω → 0, undamped) dielectric tensor, Eq. 56 of Gonze & Lee:
    ///
    /// $$\epsilon_0 = \epsilon_\infty + \sum_{m \ge 3} \frac{S_m}{\omega_m^2}$$
    ///
    /// Optical modes with zero frequency are skipped.
    pub fn static_dielectric_tensor(&self) -> Array2<f64> {
        let mut eps0 = self.epsilon_infinity.clone();
        for mode in self.modes().filter(|m| !m.is_acoustic() && m.frequency > 0.0) {
            eps0.scaled_add(1.0 / (mode.frequency * mode.frequency), &mode.oscillator_strength);
        }
        eps0
    }

    /// Serialize into a [`DielectricModelRecord`].
    pub fn to_record(&self) -> DielectricModelRecord {
        DielectricModelRecord {
            module: MODEL_MODULE.into(),
            class: MODEL_CLASS.into(),
            oscillator_strength: self
                .oscillator_strength
                .axis_iter(Axis(0))
                .map(|m| matrix_to_rows(&m))
                .collect(),
            phfreqs_gamma: self.phfreqs_gamma.to_vec(),
            structure: self.structure.to_record(),
            epsilon_infinity: matrix_to_rows(&self.epsilon_infinity.view()),
        }
    }

    /// Rebuild a model from a record.
    ///
    /// The structure is reconstructed by `irdiel-structure`. Fails with
    /// [`DielectricError::InvalidRecord`] if the `@class` tag is not
    /// [`MODEL_CLASS`].
    pub fn from_record(record: &DielectricModelRecord) -> Result<Self, DielectricError> {
        if record.class != MODEL_CLASS {
            return Err(DielectricError::InvalidRecord(format!(
                "expected @class '{}', found '{}'",
                MODEL_CLASS, record.class
            )));
        }

        let structure = Structure::from_record(&record.structure)?;
        let n = record.oscillator_strength.len();
        let oscillator_strength =
            Array3::from_shape_fn((n, 3, 3), |(m, i, j)| record.oscillator_strength[m][i][j]);
        let epsilon_infinity = Array2::from_shape_fn((3, 3), |(i, j)| record.epsilon_infinity[i][j]);

        Self::from_real(
            oscillator_strength,
            Array1::from(record.phfreqs_gamma.clone()),
            epsilon_infinity,
            structure,
        )
    }

    /// The record as a JSON string.
    pub fn to_json(&self) -> Result<String, DielectricError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Parse a model from a JSON record string.
    pub fn from_json(json: &str) -> Result<Self, DielectricError> {
        let record: DielectricModelRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }

    /// Write the record as JSON to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DielectricError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.to_record())?;
        writer.flush()?;
        Ok(())
    }

    /// Read a model previously written by [`DielectricModel::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DielectricError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Persisted form of a [`DielectricModel`].
///
/// Field order matches the JSON layout: type tags, oscillator strengths,
/// frequencies, structure, then $\epsilon_\infty$.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DielectricModelRecord {
    #[serde(rename = "@module")]
    pub module: String,
    #[serde(rename = "@class")]
    pub class: String,
    pub oscillator_strength: Vec<[[f64; 3]; 3]>,
    pub phfreqs_gamma: Vec<f64>,
    pub structure: StructureRecord,
    pub epsilon_infinity: [[f64; 3]; 3],
}

/// Real part of `strength`, and whether the dropped imaginary part exceeded
/// [`IMAG_WARN_TOL`] (in which case a warning has been logged).
fn discard_imaginary(strength: &Array3<Complex64>) -> (Array3<f64>, bool) {
    let max_imag = strength.iter().fold(0.0_f64, |acc, z| acc.max(z.im.abs()));
    let significant = max_imag > IMAG_WARN_TOL;
    if significant {
        warn!(
            "Discarding imaginary oscillator-strength components (max |Im| = {:.3e})",
            max_imag
        );
    }
    (strength.mapv(|z| z.re), significant)
}

fn matrix_to_rows(m: &ArrayView2<'_, f64>) -> [[f64; 3]; 3] {
    let mut rows = [[0.0; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = m[[i, j]];
        }
    }
    rows
}
