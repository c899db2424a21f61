//! Crystal lattice and coordinate conversion.
//!
//! Lattice vectors are stored as the rows of a 3x3 matrix, in angstroms.
//! A Cartesian position is $\mathbf{r} = M^T \mathbf{f}$ for fractional
//! coordinates $\mathbf{f}$.

use nalgebra::{Matrix3, Vector3};

use crate::structure::StructureError;

/// Volumes below this are treated as a degenerate cell.
const MIN_CELL_VOLUME: f64 = 1e-10;

/// A periodic lattice defined by three lattice vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// Lattice vectors as rows (Å).
    matrix: Matrix3<f64>,
    /// Cached $(M^T)^{-1}$ for Cartesian to fractional conversion.
    inv_transpose: Matrix3<f64>,
}

impl Lattice {
    /// Create a lattice from three row vectors `[a, b, c]`.
    ///
    /// Fails with [`StructureError::DegenerateLattice`] if the vectors are
    /// coplanar or not finite.
    pub fn new(rows: [[f64; 3]; 3]) -> Result<Self, StructureError> {
        let matrix = Matrix3::from_fn(|i, j| rows[i][j]);
        let volume = matrix.determinant();
        if !volume.is_finite() || volume.abs() < MIN_CELL_VOLUME {
            return Err(StructureError::DegenerateLattice { volume });
        }
        let inv_transpose = matrix
            .transpose()
            .try_inverse()
            .ok_or(StructureError::DegenerateLattice { volume })?;
        Ok(Self {
            matrix,
            inv_transpose,
        })
    }

    /// A cubic lattice with edge `a`.
    pub fn cubic(a: f64) -> Result<Self, StructureError> {
        Self::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// Face-centred cubic primitive cell for conventional edge `a`.
    pub fn fcc(a: f64) -> Result<Self, StructureError> {
        let h = a / 2.0;
        Self::new([[0.0, h, h], [h, 0.0, h], [h, h, 0.0]])
    }

    /// Lattice vectors as rows.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Lengths of the three lattice vectors $(a, b, c)$.
    pub fn abc(&self) -> [f64; 3] {
        let r = |i: usize| self.matrix.row(i).norm();
        [r(0), r(1), r(2)]
    }

    /// Lattice angles $(\alpha, \beta, \gamma)$ in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let v = |i: usize| -> Vector3<f64> { self.matrix.row(i).transpose() };
        let angle = |u: Vector3<f64>, w: Vector3<f64>| {
            (u.dot(&w) / (u.norm() * w.norm())).clamp(-1.0, 1.0).acos().to_degrees()
        };
        [angle(v(1), v(2)), angle(v(0), v(2)), angle(v(0), v(1))]
    }

    /// Cell volume (Å³).
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Convert fractional coordinates to Cartesian (Å).
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let r = self.matrix.transpose() * Vector3::from(frac);
        [r.x, r.y, r.z]
    }

    /// Convert Cartesian coordinates (Å) to fractional.
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> [f64; 3] {
        let f = self.inv_transpose * Vector3::from(cart);
        [f.x, f.y, f.z]
    }
}
