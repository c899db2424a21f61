//! Error type for dielectric model construction, spectrum evaluation and
//! component extraction.

use irdiel_compute::ComputeError;
use irdiel_structure::StructureError;
use thiserror::Error;

/// Errors raised by `irdiel-core`.
///
/// All of these are detected synchronously from the inputs. Numerical
/// singularities (zero broadening exactly on a mode) are not errors; they
/// show up as non-finite values in the sampled field.
#[derive(Debug, Error)]
pub enum DielectricError {
    #[error("Shape mismatch for {field}: expected {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Phonon frequency {index} is {value}; optical frequencies must be finite and non-negative")]
    InvalidFrequency { index: usize, value: f64 },

    #[error("The number of broadenings ({found}) is not the same as the number of phonon modes ({expected})")]
    BroadeningLengthMismatch { expected: usize, found: usize },

    #[error("Broadening {index} is {value}; broadenings must be finite and non-negative")]
    InvalidBroadening { index: usize, value: f64 },

    #[error("Invalid frequency grid [{freq_min}, {freq_max}]")]
    InvalidGrid { freq_min: f64, freq_max: f64 },

    #[error("Invalid value found in components: '{0}'")]
    InvalidComponentSpec(String),

    #[error("Part selection '{0}' contains neither 're' nor 'im'")]
    InvalidPartSpec(String),

    #[error("Invalid dielectric record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Compute backend error: {0}")]
    Compute(#[from] ComputeError),
}
