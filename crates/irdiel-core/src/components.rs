//! Tensor component selection.
//!
//! A [`Component`] names one entry $(i, j)$ of the 3x3 dielectric tensor and
//! is written as two direction characters, `x`/`y`/`z` or `0`/`1`/`2`
//! (`"xy"`, `"02"`). A [`Parts`] selection says whether the real part, the
//! imaginary part, or both are wanted. [`extract`] combines the two into
//! labelled curves.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::PRESENTATION_SCALE;
use crate::error::DielectricError;
use crate::types::{LabeledCurve, SampledTensorField};

/// Cartesian direction symbols, indexed by axis.
const DIRECTION_SYMBOLS: [char; 3] = ['x', 'y', 'z'];

/// Fixed direction lookup: `x`/`0` → 0, `y`/`1` → 1, `z`/`2` → 2.
fn direction_index(c: char) -> Option<usize> {
    match c {
        'x' | '0' => Some(0),
        'y' | '1' => Some(1),
        'z' | '2' => Some(2),
        _ => None,
    }
}

/// One entry of the dielectric tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Component {
    i: usize,
    j: usize,
}

impl Component {
    pub const XX: Component = Component { i: 0, j: 0 };
    pub const YY: Component = Component { i: 1, j: 1 };
    pub const ZZ: Component = Component { i: 2, j: 2 };

    /// Build from direction indices, each in `0..3`.
    pub fn new(i: usize, j: usize) -> Result<Self, DielectricError> {
        if i > 2 || j > 2 {
            return Err(DielectricError::InvalidComponentSpec(format!("({}, {})", i, j)));
        }
        Ok(Self { i, j })
    }

    /// Row and column index.
    #[inline]
    pub fn indices(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

impl FromStr for Component {
    type Err = DielectricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DielectricError::InvalidComponentSpec(s.to_string());
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => Ok(Self {
                i: direction_index(a).ok_or_else(invalid)?,
                j: direction_index(b).ok_or_else(invalid)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DIRECTION_SYMBOLS[self.i], DIRECTION_SYMBOLS[self.j])
    }
}

impl From<Component> for String {
    fn from(c: Component) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Component {
    type Error = DielectricError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Real or imaginary part of a complex value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Part {
    Re,
    Im,
}

impl Part {
    /// Label prefix used in curve names.
    pub fn label(&self) -> &'static str {
        match self {
            Part::Re => "Re",
            Part::Im => "Im",
        }
    }

    #[inline]
    pub fn apply(&self, z: Complex64) -> f64 {
        match self {
            Part::Re => z.re,
            Part::Im => z.im,
        }
    }
}

/// Which parts to extract.
///
/// Parsed from any string containing `"re"` and/or `"im"`, so `"re"`,
/// `"im"`, `"reim"` and `"im,re"` are all accepted. Extraction order is
/// always real before imaginary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parts {
    pub re: bool,
    pub im: bool,
}

impl Parts {
    pub const BOTH: Parts = Parts { re: true, im: true };

    /// Selected parts, real first.
    pub fn iter(&self) -> impl Iterator<Item = Part> {
        [(self.re, Part::Re), (self.im, Part::Im)]
            .into_iter()
            .filter_map(|(on, part)| on.then_some(part))
    }
}

impl Default for Parts {
    fn default() -> Self {
        Self::BOTH
    }
}

impl FromStr for Parts {
    type Err = DielectricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = Parts {
            re: s.contains("re"),
            im: s.contains("im"),
        };
        if !parts.re && !parts.im {
            return Err(DielectricError::InvalidPartSpec(s.to_string()));
        }
        Ok(parts)
    }
}

/// Curve label for a part of a component, e.g. `Re{$\epsilon_{xy}$}`.
pub fn curve_label(part: Part, component: Component) -> String {
    format!("{}{{$\\epsilon_{{{}}}$}}", part.label(), component)
}

/// Cut labelled curves out of a sampled field.
///
/// One curve is produced per (component, part) pair: components in the given
/// order, and for each component the real part before the imaginary part.
/// The x axis is the frequency grid rescaled by
/// [`PRESENTATION_SCALE`](crate::constants::PRESENTATION_SCALE).
pub fn extract(field: &SampledTensorField, components: &[Component], parts: Parts) -> Vec<LabeledCurve> {
    let x: Vec<f64> = field.frequencies.iter().map(|f| f * PRESENTATION_SCALE).collect();

    let mut curves = Vec::with_capacity(components.len() * 2);
    for &component in components {
        let values = field.component(component);
        for part in parts.iter() {
            curves.push(LabeledCurve {
                label: curve_label(part, component),
                component,
                part,
                x: x.clone(),
                y: values.iter().map(|&z| part.apply(z)).collect(),
            });
        }
    }
    curves
}

/// Like [`extract`], taking components and parts as strings.
///
/// Every specifier is validated before any curve is built.
///
/// # Example
/// ```
/// # use irdiel_core::components::extract_named;
/// # fn demo(field: &irdiel_core::SampledTensorField) -> Result<(), irdiel_core::DielectricError> {
/// let curves = extract_named(field, &["xx", "zz"], "reim")?;
/// assert_eq!(curves.len(), 4);
/// # Ok(())
/// # }
/// ```
pub fn extract_named<S: AsRef<str>>(
    field: &SampledTensorField,
    components: &[S],
    parts: &str,
) -> Result<Vec<LabeledCurve>, DielectricError> {
    let components = components
        .iter()
        .map(|c| c.as_ref().parse())
        .collect::<Result<Vec<Component>, _>>()?;
    let parts: Parts = parts.parse()?;
    Ok(extract(field, &components, parts))
}
