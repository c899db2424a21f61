//! # IRDiel Structure
//!
//! Crystal structure handling for the IRDiel workspace. The dielectric model
//! in `irdiel-core` carries a [`Structure`] for provenance only; this crate
//! owns its representation and its persisted form.
//!
//! - **Lattice** ([`lattice`]): lattice vectors and fractional/Cartesian
//!   conversion.
//! - **Structure** ([`structure`]): sites on a lattice and the
//!   [`StructureRecord`](structure::StructureRecord) serialization contract.
//! - **File parsers** ([`parsers`]): import from extended-XYZ and JSON
//!   structure records.

pub mod lattice;
pub mod parsers;
pub mod structure;

pub use lattice::Lattice;
pub use structure::{Site, Structure, StructureError, StructureRecord};
