//! Crystal structure and its persisted record.
//!
//! A [`Structure`] is a [`Lattice`] plus an ordered list of fully occupied
//! sites. Its serialized form, [`StructureRecord`], is a tagged mapping that
//! other records (such as the dielectric model record) embed verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lattice::Lattice;

/// Type tags written into every structure record.
pub const STRUCTURE_MODULE: &str = "irdiel_structure::structure";
pub const STRUCTURE_CLASS: &str = "Structure";

/// Occupancies within this distance of 1.0 count as fully occupied.
const OCCUPANCY_TOL: f64 = 1e-8;

/// Errors from building or reconstructing a structure.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Degenerate lattice: cell volume {volume:.3e}")]
    DegenerateLattice { volume: f64 },

    #[error("Site {index}: {message}")]
    InvalidSite { index: usize, message: String },

    #[error("Invalid structure record: {0}")]
    InvalidRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single atomic site.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// Element symbol.
    pub species: String,
    /// Fractional coordinates.
    pub frac_coords: [f64; 3],
    /// Optional site label; defaults to the species when absent.
    pub label: Option<String>,
}

impl Site {
    pub fn new(species: impl Into<String>, frac_coords: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            frac_coords,
            label: None,
        }
    }

    /// The label, falling back to the species symbol.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.species)
    }
}

/// A periodic crystal structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    lattice: Lattice,
    sites: Vec<Site>,
}

impl Structure {
    /// Create a structure from a lattice and sites in fractional coordinates.
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Result<Self, StructureError> {
        for (index, site) in sites.iter().enumerate() {
            if site.species.trim().is_empty() {
                return Err(StructureError::InvalidSite {
                    index,
                    message: "empty species".into(),
                });
            }
            if site.frac_coords.iter().any(|x| !x.is_finite()) {
                return Err(StructureError::InvalidSite {
                    index,
                    message: format!("non-finite coordinates {:?}", site.frac_coords),
                });
            }
        }
        Ok(Self { lattice, sites })
    }

    /// Create a structure from Cartesian positions (Å).
    ///
    /// # Arguments
    /// * `lattice` - Periodic cell.
    /// * `species` - One element symbol per site.
    /// * `cart_coords` - Cartesian positions, same length as `species`.
    pub fn from_cartesian(
        lattice: Lattice,
        species: &[&str],
        cart_coords: &[[f64; 3]],
    ) -> Result<Self, StructureError> {
        if species.len() != cart_coords.len() {
            return Err(StructureError::InvalidSite {
                index: species.len().min(cart_coords.len()),
                message: format!(
                    "{} species but {} coordinates",
                    species.len(),
                    cart_coords.len()
                ),
            });
        }
        let sites = species
            .iter()
            .zip(cart_coords)
            .map(|(s, &r)| Site::new(*s, lattice.cart_to_frac(r)))
            .collect();
        Self::new(lattice, sites)
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Cartesian position of every site (Å).
    pub fn cart_coords(&self) -> Vec<[f64; 3]> {
        self.sites
            .iter()
            .map(|s| self.lattice.frac_to_cart(s.frac_coords))
            .collect()
    }

    /// Chemical formula with elements in order of first appearance, e.g. `"Al1 As1"`.
    pub fn formula(&self) -> String {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for site in &self.sites {
            match counts.iter_mut().find(|(el, _)| *el == site.species) {
                Some((_, n)) => *n += 1,
                None => counts.push((site.species.as_str(), 1)),
            }
        }
        counts
            .iter()
            .map(|(el, n)| format!("{}{}", el, n))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `other` has the same species and the same lattice and
    /// fractional coordinates within `tol`.
    pub fn approx_eq(&self, other: &Structure, tol: f64) -> bool {
        let close = |a: &[f64; 3], b: &[f64; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tol);
        let rows_a = self.lattice.rows();
        let rows_b = other.lattice.rows();
        self.sites.len() == other.sites.len()
            && (0..3).all(|i| close(&rows_a[i], &rows_b[i]))
            && self.sites.iter().zip(&other.sites).all(|(a, b)| {
                a.species == b.species && close(&a.frac_coords, &b.frac_coords)
            })
    }

    /// Serialize into a [`StructureRecord`].
    pub fn to_record(&self) -> StructureRecord {
        StructureRecord {
            module: STRUCTURE_MODULE.into(),
            class: STRUCTURE_CLASS.into(),
            lattice: LatticeRecord {
                matrix: self.lattice.rows(),
            },
            sites: self
                .sites
                .iter()
                .map(|s| SiteRecord {
                    species: vec![SpeciesOccupancy {
                        element: s.species.clone(),
                        occu: 1.0,
                    }],
                    abc: s.frac_coords,
                    xyz: self.lattice.frac_to_cart(s.frac_coords),
                    label: s.label.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a structure from a record.
    ///
    /// Only ordered structures are supported: each site must carry exactly one
    /// species with unit occupancy. Fractional `abc` coordinates are used;
    /// `xyz` is ignored.
    pub fn from_record(record: &StructureRecord) -> Result<Self, StructureError> {
        if record.class != STRUCTURE_CLASS {
            return Err(StructureError::InvalidRecord(format!(
                "expected @class '{}', found '{}'",
                STRUCTURE_CLASS, record.class
            )));
        }
        let lattice = Lattice::new(record.lattice.matrix)?;
        let mut sites = Vec::with_capacity(record.sites.len());
        for (index, site) in record.sites.iter().enumerate() {
            let species = match site.species.as_slice() {
                [only] if (only.occu - 1.0).abs() <= OCCUPANCY_TOL => only.element.clone(),
                _ => {
                    return Err(StructureError::InvalidSite {
                        index,
                        message: "partial or mixed occupancy is not supported".into(),
                    })
                }
            };
            sites.push(Site {
                species,
                frac_coords: site.abc,
                label: site.label.clone(),
            });
        }
        Self::new(lattice, sites)
    }

    /// Parse a structure from a JSON record string.
    pub fn from_json(json: &str) -> Result<Self, StructureError> {
        let record: StructureRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }
}

/// Serialized form of a [`Structure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    #[serde(rename = "@module")]
    pub module: String,
    #[serde(rename = "@class")]
    pub class: String,
    pub lattice: LatticeRecord,
    pub sites: Vec<SiteRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeRecord {
    pub matrix: [[f64; 3]; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub species: Vec<SpeciesOccupancy>,
    pub abc: [f64; 3],
    pub xyz: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesOccupancy {
    pub element: String,
    pub occu: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rocksalt() -> Structure {
        Structure::new(
            Lattice::fcc(5.64).unwrap(),
            vec![Site::new("Na", [0.0, 0.0, 0.0]), Site::new("Cl", [0.5, 0.5, 0.5])],
        )
        .unwrap()
    }

    #[test]
    fn test_record_roundtrip() {
        let s = rocksalt();
        let back = Structure::from_record(&s.to_record()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_record_tags() {
        let json = serde_json::to_value(rocksalt().to_record()).unwrap();
        assert_eq!(json["@class"], "Structure");
        assert_eq!(json["sites"][1]["species"][0]["element"], "Cl");
        assert_eq!(json["sites"][1]["species"][0]["occu"], 1.0);
        assert!(json["sites"][0].get("label").is_none());
    }

    #[test]
    fn test_wrong_class_rejected() {
        let mut record = rocksalt().to_record();
        record.class = "Molecule".into();
        assert!(matches!(
            Structure::from_record(&record),
            Err(StructureError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_partial_occupancy_rejected() {
        let mut record = rocksalt().to_record();
        record.sites[0].species[0].occu = 0.5;
        assert!(matches!(
            Structure::from_record(&record),
            Err(StructureError::InvalidSite { index: 0, .. })
        ));
    }

    #[test]
    fn test_formula_and_labels() {
        let mut s = rocksalt();
        assert_eq!(s.formula(), "Na1 Cl1");
        s.sites[0].label = Some("Na_a".into());
        assert_eq!(s.sites()[0].label(), "Na_a");
        assert_eq!(s.sites()[1].label(), "Cl");
    }

    #[test]
    fn test_from_cartesian_length_mismatch() {
        let err = Structure::from_cartesian(Lattice::cubic(3.0).unwrap(), &["Si", "Si"], &[[0.0; 3]]);
        assert!(matches!(err, Err(StructureError::InvalidSite { .. })));
    }
}
