//! hdt: reader and writer for HDT (Header-Dictionary-Triples) RDF files.
//!
//! An HDT file is a global control block, an N-Triples header, a
//! four-section front-coded dictionary and a triples index (bitmap
//! adjacency tree or flat list). Every block is CRC-protected and every
//! checksum is verified on open.
//!
//! Quick start: write a file
//!
//! ```no_run
//! use hdt::{Term, Triple, write_file};
//!
//! let triples = vec![Triple::new(
//!     Term::iri("http://example.org/Alice"),
//!     Term::iri("http://xmlns.com/foaf/0.1/name"),
//!     Term::literal("Alice"),
//! )];
//! write_file("example.hdt", &triples).expect("write ok");
//! ```
//!
//! Read it back and match a pattern
//!
//! ```no_run
//! use hdt::{Hdt, Term};
//! use std::path::Path;
//!
//! let hdt = Hdt::open(Path::new("example.hdt")).expect("open");
//! let alice = Term::iri("http://example.org/Alice");
//! for t in hdt.triples_matching(Some(&alice), None, None).expect("pattern") {
//!     println!("{}", t.expect("triple"));
//! }
//! ```

pub mod bitmap;
pub mod control_info;
pub mod crc;
pub mod cursor;
pub mod dict_section;
pub mod dictionary;
pub mod error;
pub mod log_array;
pub mod options;
pub mod reader;
pub mod term;
pub mod triples;
pub mod vbyte;
pub mod writer;

pub use control_info::{ControlInfo, ControlType};
pub use dictionary::{Dictionary, IdSequence, Position};
pub use error::HdtError;
pub use options::{ReaderOptions, WriterOptions};
pub use reader::{Hdt, TripleIter};
pub use term::{Term, Triple};
pub use triples::{IdTriple, Restriction, TripleOrder, TriplesFormat, TriplesMetadata};
pub use writer::{
    StreamingWriter, serialize, serialize_with_options, write_file, write_file_with_options,
};

#[cfg(feature = "oxigraph")]
pub use writer::write_graph_from_oxigraph;

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, HdtError>;
