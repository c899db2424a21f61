//! Parser for extended `.xyz` coordinate files.
//!
//! Extended XYZ is the plain XYZ format with the periodic cell carried in the
//! comment line:
//! ```text
//! <num_atoms>
//! Lattice="ax ay az bx by bz cx cy cz" <other key=value pairs>
//! <element> <x> <y> <z>
//! ...
//! ```
//!
//! Coordinates and lattice vectors are Cartesian, in angstroms.

use super::ParseError;
use crate::lattice::Lattice;
use crate::structure::Structure;

/// Parse an extended XYZ file from a string.
pub fn parse_extxyz(content: &str) -> Result<Structure, ParseError> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 2 {
        return Err(ParseError::FormatError {
            line: 1,
            message: "XYZ file must have a count line and a comment line".into(),
        });
    }

    let num_atoms: usize = lines[0].trim().parse().map_err(|_| ParseError::FormatError {
        line: 1,
        message: "First line must be the number of atoms".into(),
    })?;

    let lattice = Lattice::new(parse_lattice(lines[1])?)?;

    let mut species = Vec::with_capacity(num_atoms);
    let mut coords = Vec::with_capacity(num_atoms);
    for (idx, line) in lines[2..].iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(ParseError::FormatError {
                line: idx + 3,
                message: format!("Expected 'element x y z', got '{}'", line),
            });
        }

        let mut r = [0.0; 3];
        for (k, axis) in ["x", "y", "z"].iter().enumerate() {
            r[k] = parts[k + 1].parse().map_err(|_| ParseError::FormatError {
                line: idx + 3,
                message: format!("Invalid {} coordinate: {}", axis, parts[k + 1]),
            })?;
        }

        species.push(parts[0]);
        coords.push(r);
    }

    if species.len() != num_atoms {
        return Err(ParseError::FormatError {
            line: 1,
            message: format!("Header says {} atoms but found {}", num_atoms, species.len()),
        });
    }

    Ok(Structure::from_cartesian(lattice, &species, &coords)?)
}

/// Extract the nine lattice components from the comment line.
fn parse_lattice(comment: &str) -> Result<[[f64; 3]; 3], ParseError> {
    let missing = || ParseError::FormatError {
        line: 2,
        message: "Comment line must contain Lattice=\"ax ay az bx by bz cx cy cz\"".into(),
    };

    let start = comment.find("Lattice=\"").ok_or_else(missing)? + "Lattice=\"".len();
    let len = comment[start..].find('"').ok_or_else(missing)?;

    let values = comment[start..start + len]
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>().map_err(|_| ParseError::FormatError {
                line: 2,
                message: format!("Invalid lattice component: {}", v),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() != 9 {
        return Err(ParseError::FormatError {
            line: 2,
            message: format!("Lattice needs 9 components, got {}", values.len()),
        });
    }

    Ok([
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ])
}
