//! Plot description for dielectric spectra.
//!
//! A [`SpectrumPlot`] gathers the extracted curves, axis labels, optional
//! limits and the phonon-frequency markers. It is a plain serialisable
//! description; writing it out is left to the runner.

use irdiel_core::constants::PRESENTATION_SCALE;
use irdiel_core::{DielectricModel, LabeledCurve};
use serde::Serialize;

pub const X_LABEL: &str = "Frequency (meV)";
pub const Y_LABEL: &str = r"$\epsilon(\omega)$";

/// A point drawn on the frequency axis at an optical phonon frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhononMarker {
    pub mode: usize,
    /// Mode frequency in meV.
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpectrumPlot {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub curves: Vec<LabeledCurve>,
    /// Empty when phonon frequencies are not shown.
    pub markers: Vec<PhononMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xlim: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ylim: Option<[f64; 2]>,
}

impl SpectrumPlot {
    /// Build the plot for `model` from already extracted curves.
    ///
    /// Markers sit at $y = 0$ for every optical mode, which makes IR-inactive
    /// modes (no peak in the curves) easy to spot.
    pub fn new(model: &DielectricModel, curves: Vec<LabeledCurve>, show_phonon_frequencies: bool) -> Self {
        let markers = if show_phonon_frequencies {
            model
                .modes()
                .filter(|m| !m.is_acoustic())
                .map(|m| PhononMarker {
                    mode: m.index,
                    x: m.frequency * PRESENTATION_SCALE,
                    y: 0.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            title: format!("IR dielectric tensor of {}", model.structure().formula()),
            xlabel: X_LABEL.into(),
            ylabel: Y_LABEL.into(),
            curves,
            markers,
            xlim: None,
            ylim: None,
        }
    }

    pub fn with_limits(mut self, xlim: Option<[f64; 2]>, ylim: Option<[f64; 2]>) -> Self {
        self.xlim = xlim;
        self.ylim = ylim;
        self
    }

    /// Number of points shared by every curve (0 without curves).
    pub fn samples(&self) -> usize {
        self.curves.first().map_or(0, |c| c.len())
    }
}
