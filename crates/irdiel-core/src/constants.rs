//! Numerical defaults and conventions shared across the crate.

/// Number of leading acoustic (translational) modes excluded from the
/// optical sum.
pub const ACOUSTIC_MODES: usize = 3;

/// Default per-mode broadening, relative to the mode frequency.
pub const DEFAULT_BROADENING: f64 = 5e-5;

/// Default number of frequency samples.
pub const DEFAULT_DIVISIONS: usize = 500;

/// When the upper grid bound is not given it is placed this many
/// (maximum) broadenings above the highest phonon frequency.
pub const AUTO_RANGE_BROADENINGS: f64 = 20.0;

/// Frequencies are supplied in eV and presented in meV.
pub const PRESENTATION_SCALE: f64 = 1000.0;

/// Imaginary oscillator-strength components larger than this are reported
/// before being discarded.
pub const IMAG_WARN_TOL: f64 = 1e-8;
