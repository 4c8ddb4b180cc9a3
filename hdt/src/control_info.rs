//! Control information: the self-describing frame in front of every HDT
//! section.
//!
//! ```text
//! "$HDT" | type:u8 | format\0 | k=v;k=v\0 | crc16:u16 (big-endian)
//! ```
//!
//! The CRC16 covers every byte of the block before it, cookie included.

use std::fmt;

use crate::Result;
use crate::crc::crc16;
use crate::cursor::ByteReader;
use crate::error::HdtError;

pub const COOKIE: &[u8; 4] = b"$HDT";

pub const HDT_V1: &str = "<http://purl.org/HDT/hdt#HDTv1>";
pub const HEADER_NTRIPLES: &str = "ntriples";
pub const DICTIONARY_FOUR: &str = "<http://purl.org/HDT/hdt#dictionaryFour>";
pub const TRIPLES_BITMAP: &str = "<http://purl.org/HDT/hdt#triplesBitmap>";
pub const TRIPLES_LIST: &str = "<http://purl.org/HDT/hdt#triplesList>";

/// Kind of section a control block introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlType {
    Global = 1,
    Header = 2,
    Dictionary = 3,
    Triples = 4,
    Index = 5,
}

impl ControlType {
    pub fn from_u8(v: u8) -> Option<Self> {
        use ControlType::*;
        Some(match v {
            1 => Global,
            2 => Header,
            3 => Dictionary,
            4 => Triples,
            5 => Index,
            _ => return None,
        })
    }
}

/// A decoded control block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    pub kind: ControlType,
    pub format: String,
    /// Properties in file order.
    pub properties: Vec<(String, String)>,
    pub crc: u16,
}

impl ControlInfo {
    pub fn new(kind: ControlType, format: impl Into<String>) -> Self {
        Self {
            kind,
            format: format.into(),
            properties: Vec::new(),
            crc: 0,
        }
    }

    /// Builder-style property setter; replaces an existing key in place.
    pub fn with_property(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a numeric property.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| HdtError::format(format!("property {key}={v} is not a number"))),
        }
    }

    /// True if this block's format names `expected`, with or without angle brackets.
    pub fn format_is(&self, expected: &str) -> bool {
        strip_brackets(&self.format) == strip_brackets(expected)
    }

    /// Decode a control block at `offset`; returns it with the number of bytes consumed.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(bytes, offset);
        let cookie = r
            .read_bytes(COOKIE.len())
            .map_err(|_| HdtError::format(format!("missing $HDT cookie at offset {offset}")))?;
        if cookie != COOKIE {
            return Err(HdtError::format(format!(
                "bad HDT cookie at offset {offset}: {cookie:02x?}"
            )));
        }
        let type_byte = r.read_u8()?;
        let format = utf8(r.read_cstr()?, "control format")?;
        let props = utf8(r.read_cstr()?, "control properties")?;
        let body_end = r.pos();
        let stored = r.read_u16_be()?;
        let computed = crc16(&bytes[offset..body_end]);
        if stored != computed {
            return Err(HdtError::Checksum {
                section: "control information",
                stored: u32::from(stored),
                computed: u32::from(computed),
            });
        }
        let kind = ControlType::from_u8(type_byte).ok_or_else(|| {
            HdtError::format(format!(
                "unexpected control type {type_byte} at offset {offset}"
            ))
        })?;
        let info = ControlInfo {
            kind,
            format,
            properties: parse_properties(&props),
            crc: stored,
        };
        Ok((info, r.pos() - offset))
    }

    /// Append the encoded block to `out`; returns the number of bytes written.
    pub fn encode(&self, out: &mut Vec<u8>) -> usize {
        let start = out.len();
        out.extend_from_slice(COOKIE);
        out.push(self.kind as u8);
        out.extend_from_slice(self.format.as_bytes());
        out.push(0);
        out.extend_from_slice(self.properties_string().as_bytes());
        out.push(0);
        let crc = crc16(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
        out.len() - start
    }

    fn properties_string(&self) -> String {
        self.properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for ControlInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.format)?;
        if !self.properties.is_empty() {
            write!(f, " [{}]", self.properties_string())?;
        }
        Ok(())
    }
}

fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('<')
        .and_then(|x| x.strip_suffix('>'))
        .unwrap_or(s)
}

fn utf8(b: &[u8], what: &str) -> Result<String> {
    String::from_utf8(b.to_vec()).map_err(|_| HdtError::decode(format!("{what} is not UTF-8")))
}

fn parse_properties(s: &str) -> Vec<(String, String)> {
    s.split(';')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (kv.to_string(), String::new()),
        })
        .collect()
}
