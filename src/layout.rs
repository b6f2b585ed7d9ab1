//! Opaque layout document
//!
//! The uploaded spatial layout is never inspected structurally; it is parsed
//! once to prove it is well-formed JSON, then carried as a value plus its
//! canonical pretty-printed text. The text form is what gets embedded into
//! the system entry and written to the canonical copy on disk.

use std::path::Path;

use serde_json::Value;

use crate::error::PersistenceError;

/// File name of the canonical layout copy inside the layout directory
pub const LATEST_LAYOUT_FILE: &str = "latest_layout.json";

/// Most recently ingested layout: opaque value + canonical text form
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutDocument {
    value: Value,
    canonical: String,
}

impl LayoutDocument {
    /// Parses raw upload bytes; fails on anything that is not well-formed JSON.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(raw)?;
        let canonical = serde_json::to_string_pretty(&value)?;
        Ok(Self { value, canonical })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Pretty-printed form embedded into the system entry
    pub fn canonical_text(&self) -> &str {
        &self.canonical
    }

    /// Writes the canonical copy, creating parent directories when missing.
    /// Unlike history snapshots this write is fatal for the ingest.
    pub fn persist_to(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(path, e))?;
        }
        std::fs::write(path, &self.canonical).map_err(|e| PersistenceError::io(path, e))
    }
}
