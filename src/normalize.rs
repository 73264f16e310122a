//! Record normalizer - raw JSON log records to (text, metadata) pairs
//!
//! Each element of the uploaded array becomes one [`NormalizedRecord`]. The
//! text is the compact `serde_json` serialization of the element, so
//! `serde_json::from_str(&record.text)` yields the original value back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};

/// Metadata stored alongside every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Position in the uploaded array
    pub index: usize,
}

/// One log record ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Normalize a decoded JSON value
///
/// The top level must be an array; anything else fails with
/// [`Error::Shape`] before any record is produced.
pub fn normalize(value: &Value) -> Result<Vec<NormalizedRecord>> {
    let elements = value.as_array().ok_or_else(|| Error::shape(value))?;

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            Ok(NormalizedRecord {
                text: serde_json::to_string(element)?,
                metadata: ChunkMetadata { index },
            })
        })
        .collect()
}

/// Decode JSON text and normalize it
pub fn parse_records(text: &str) -> Result<Vec<NormalizedRecord>> {
    let value: Value = serde_json::from_str(text)?;
    normalize(&value)
}

/// Read a JSON file and normalize it
pub fn read_records(path: &Path) -> Result<Vec<NormalizedRecord>> {
    let text = std::fs::read_to_string(path)?;
    parse_records(&text)
}
