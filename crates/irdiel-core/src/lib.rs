//! # IRDiel Core
//!
//! Frequency-dependent ionic dielectric tensors from zone-centre phonon data.
//!
//! ## Architecture
//!
//! A [`DielectricModel`](model::DielectricModel) holds the phonon inputs
//! (oscillator strengths, Γ-point frequencies, $\epsilon_\infty$ and the
//! crystal structure). The [`SpectrumSolver`](spectrum::SpectrumSolver) turns
//! it into a [`SampledTensorField`](types::SampledTensorField) by summing
//! damped Lorentz oscillators over the optical modes, and
//! [`extract`](components::extract) slices that field into labelled real or
//! imaginary curves for plotting.
//!
//! ## Modules
//!
//! - [`model`]: The dielectric model and its persisted record.
//! - [`spectrum`]: Broadening policy, grid parameters and the solver.
//! - [`components`]: Tensor component selection and curve labelling.
//! - [`types`]: Sampled tensor field and labelled curves.
//! - [`error`]: The crate error type.
//! - [`constants`]: Defaults and conventions.

pub mod components;
pub mod constants;
pub mod error;
pub mod model;
pub mod spectrum;
pub mod types;

pub use components::{extract, extract_named, Component, Part, Parts};
pub use error::DielectricError;
pub use model::{DielectricModel, DielectricModelRecord, PhononMode};
pub use spectrum::{compute_spectrum, Broadening, SpectrumParams, SpectrumSolver};
pub use types::{LabeledCurve, SampledTensorField};
