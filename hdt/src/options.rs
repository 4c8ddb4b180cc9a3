//! Reader and writer configuration.
//!
//! Both option types deserialize from JSON with every field optional, so a
//! config file only needs to name what it changes:
//!
//! ```json
//! { "block_size": 32, "order": "SPO", "format": "List" }
//! ```

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::triples::{TripleOrder, TriplesFormat};

/// Options applied when opening an HDT file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderOptions {
    /// Replace blank node labels with `b<id>`.
    pub simplify_blank_nodes: bool,
    /// Capacity of the subject/predicate term cache; 0 disables it.
    pub cache_capacity: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            simplify_blank_nodes: false,
            cache_capacity: 2048,
        }
    }
}

/// Options controlling file emission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WriterOptions {
    /// Strings per front-coded dictionary block.
    pub block_size: usize,
    /// Physical nesting order of the triples section.
    pub order: TripleOrder,
    /// Bitmap adjacency or flat list triples.
    pub format: TriplesFormat,
    /// Subject of the header's dataset description.
    pub base_iri: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            block_size: 16,
            order: TripleOrder::SPO,
            format: TriplesFormat::Bitmap,
            base_iri: "http://example.org/hdt".to_string(),
        }
    }
}

impl ReaderOptions {
    pub fn from_file(file: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        File::create(file)?.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl WriterOptions {
    pub fn from_file(file: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        File::create(file)?.write_all(s.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let w: WriterOptions =
            serde_json::from_str(r#"{ "block_size": 32, "order": "POS" }"#).unwrap();
        assert_eq!(w.block_size, 32);
        assert_eq!(w.order, TripleOrder::POS);
        assert_eq!(w.format, TriplesFormat::Bitmap);
        assert_eq!(w.base_iri, "http://example.org/hdt");

        let r: ReaderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(r, ReaderOptions::default());
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.json");
        let opts = WriterOptions {
            format: TriplesFormat::List,
            order: TripleOrder::OPS,
            ..Default::default()
        };
        opts.save_to_file(&path).unwrap();
        assert_eq!(WriterOptions::from_file(&path).unwrap(), opts);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            WriterOptions::from_file(&path),
            Err(crate::HdtError::Config(_))
        ));
    }
}
