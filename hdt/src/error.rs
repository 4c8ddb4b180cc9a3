//! Error type shared by every decode and encode path.

use thiserror::Error;

use crate::dictionary::Position;
use crate::triples::TripleOrder;

/// Errors that can arise when reading, validating, or writing an HDT file.
#[derive(Debug, Error)]
pub enum HdtError {
    /// Underlying I/O error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Bad magic cookie, unknown control type, or unsupported format identifier.
    #[error("format error: {0}")]
    Format(String),

    /// A CRC did not verify. Always fatal; the file is corrupt.
    #[error("{section} CRC mismatch: stored {stored:#x}, computed {computed:#x}")]
    Checksum {
        section: &'static str,
        stored: u32,
        computed: u32,
    },

    /// Structurally invalid bytes: truncation, bad prefix lengths, offsets
    /// that disagree with what was consumed.
    #[error("decode error: {0}")]
    Decode(String),

    /// Pattern restriction was requested against a non-SPO triples index.
    #[error("pattern restriction is only supported for SPO ordering (index is {0})")]
    UnsupportedOrdering(TripleOrder),

    /// No term exists for `id` at `position`.
    #[error("no term for id {id} in {position} position")]
    LookupMiss { id: u64, position: Position },

    /// Caller input that cannot be encoded.
    #[error("{0}")]
    Invalid(String),

    /// Reader or writer options failed to (de)serialize.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl HdtError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        HdtError::Decode(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        HdtError::Format(msg.into())
    }

    /// True for errors that signal file corruption rather than a caller mistake.
    pub fn is_corruption(&self) -> bool {
        matches!(self, HdtError::Checksum { .. } | HdtError::Decode(_))
    }
}
