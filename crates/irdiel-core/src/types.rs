//! Result containers shared across the crate.
//!
//! A [`SampledTensorField`] is what the spectrum solver produces; a
//! [`LabeledCurve`] is what the component extractor hands on to presentation
//! code.

use ndarray::{Array1, Array3, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::components::{Component, Part};

/// The complex dielectric tensor sampled on a uniform frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTensorField {
    /// Sample frequencies (eV), non-decreasing. Shape `(D,)`.
    pub frequencies: Array1<f64>,
    /// $\epsilon(\omega)$ at each sample. Shape `(D, 3, 3)`.
    pub tensors: Array3<Complex64>,
}

impl SampledTensorField {
    /// Number of frequency samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// The 3x3 tensor at sample `k`.
    pub fn tensor(&self, k: usize) -> ArrayView2<'_, Complex64> {
        self.tensors.index_axis(Axis(0), k)
    }

    /// The `(i, j)` entry across the whole grid.
    pub fn component(&self, component: Component) -> ArrayView1<'_, Complex64> {
        let (i, j) = component.indices();
        self.tensors.slice(ndarray::s![.., i, j])
    }

    /// Iterate over `(frequency, tensor)` pairs in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, ArrayView2<'_, Complex64>)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.tensors.axis_iter(Axis(0)))
    }
}

/// One real-valued curve cut out of a [`SampledTensorField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledCurve {
    /// Display label, e.g. `Re{$\epsilon_{xx}$}`.
    pub label: String,
    /// Tensor entry the curve was taken from.
    pub component: Component,
    /// Real or imaginary part.
    pub part: Part,
    /// Frequencies in presentation units (meV).
    pub x: Vec<f64>,
    /// Selected part of the tensor entry.
    pub y: Vec<f64>,
}

impl LabeledCurve {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
