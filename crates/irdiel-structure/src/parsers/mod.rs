//! File format parsers for importing crystal structures.
//!
//! Supported formats:
//! - [`.xyz` / `.extxyz`](xyz): extended XYZ with a `Lattice="..."` comment
//! - `.json`: a [`StructureRecord`](crate::structure::StructureRecord)

pub mod xyz;

use std::path::Path;

use thiserror::Error;

use crate::structure::{Structure, StructureError};

/// Errors during structure file parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Read a structure file, choosing the parser from the file extension.
pub fn read_structure(path: &Path) -> Result<Structure, ParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let content = match ext.as_str() {
        "xyz" | "extxyz" | "json" => std::fs::read_to_string(path)?,
        other => return Err(ParseError::UnsupportedFormat(format!(".{}", other))),
    };

    if ext == "json" {
        Ok(Structure::from_json(&content)?)
    } else {
        xyz::parse_extxyz(&content)
    }
}
