//! Fixed-width packed integer arrays ("LogArray", sequence type 1).
//!
//! ```text
//! type:u8 (=1) | width:u8 | count:vbyte | crc8 | data[ceil(width*count/8)] | crc32:u32 (BE)
//! ```
//!
//! Values are packed as an LSB-first bit stream; element `i` occupies bits
//! `[i*width, i*width + width)`. The reader walks the stream through 64-bit
//! little-endian words, so a value may straddle two words.

use std::ops::Range;

use crate::Result;
use crate::crc::{crc8, crc32};
use crate::cursor::ByteReader;
use crate::error::HdtError;
use crate::vbyte::push_vbyte;

pub const LOG_ARRAY_TYPE: u8 = 1;

/// A parsed LogArray. Holds only the location of the packed data; element
/// access takes the backing bytes, so many arrays can share one file image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogArray {
    width: u8,
    len: usize,
    data: Range<usize>,
}

impl LogArray {
    /// Parse and verify a LogArray at `offset`; returns it with the number of
    /// bytes consumed.
    pub fn parse(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(bytes, offset);
        let ty = r.read_u8()?;
        if ty != LOG_ARRAY_TYPE {
            return Err(HdtError::decode(format!(
                "expected LogArray type {LOG_ARRAY_TYPE} at offset {offset}, found {ty}"
            )));
        }
        let width = r.read_u8()?;
        let len = r.read_vbyte_usize()?;
        let header_end = r.pos();
        let stored8 = r.read_u8()?;
        let computed8 = crc8(&bytes[offset..header_end]);
        if stored8 != computed8 {
            return Err(HdtError::Checksum {
                section: "LogArray header",
                stored: u32::from(stored8),
                computed: u32::from(computed8),
            });
        }
        if width > 64 {
            return Err(HdtError::format(format!(
                "LogArray width {width} exceeds 64 bits"
            )));
        }
        let nbytes = packed_len(width, len)?;
        let start = r.pos();
        let payload = r.read_bytes(nbytes)?;
        let stored32 = r.read_u32_be()?;
        let computed32 = crc32(payload);
        if stored32 != computed32 {
            return Err(HdtError::Checksum {
                section: "LogArray data",
                stored: stored32,
                computed: computed32,
            });
        }
        let arr = LogArray {
            width,
            len,
            data: start..start + nbytes,
        };
        Ok((arr, r.pos() - offset))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Element `i`, or `None` when `i` is out of range or `bytes` is not the
    /// image this array was parsed from.
    pub fn get(&self, bytes: &[u8], i: usize) -> Option<u64> {
        if i >= self.len {
            return None;
        }
        let w = self.width as usize;
        if w == 0 {
            return Some(0);
        }
        let data = bytes.get(self.data.clone())?;
        let bit = i * w;
        let (word, shift) = (bit / 64, bit % 64);
        let mut v = read_word(data, word) >> shift;
        if shift + w > 64 {
            v |= read_word(data, word + 1) << (64 - shift);
        }
        Some(v & mask(w))
    }

    /// Decode every element.
    pub fn to_vec(&self, bytes: &[u8]) -> Result<Vec<u64>> {
        (0..self.len)
            .map(|i| {
                self.get(bytes, i)
                    .ok_or_else(|| HdtError::decode(format!("LogArray element {i} out of bounds")))
            })
            .collect()
    }

    /// Encode `values` with the narrowest width that holds the largest one.
    pub fn encode(values: &[u64], out: &mut Vec<u8>) {
        let width = values.iter().copied().map(bits_for).max().unwrap_or(0);
        let start = out.len();
        out.push(LOG_ARRAY_TYPE);
        out.push(width);
        push_vbyte(values.len() as u64, out);
        let c8 = crc8(&out[start..]);
        out.push(c8);

        let w = width as usize;
        let mut words = vec![0u64; (w * values.len()).div_ceil(64)];
        if w > 0 {
            for (i, &v) in values.iter().enumerate() {
                let bit = i * w;
                let (word, shift) = (bit / 64, bit % 64);
                words[word] |= v << shift;
                if shift + w > 64 {
                    words[word + 1] |= v >> (64 - shift);
                }
            }
        }
        let nbytes = (w * values.len()).div_ceil(8);
        let packed: Vec<u8> = words
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .take(nbytes)
            .collect();
        out.extend_from_slice(&packed);
        out.extend_from_slice(&crc32(&packed).to_be_bytes());
    }
}

/// Bits needed to represent `v` (0 for 0).
pub fn bits_for(v: u64) -> u8 {
    (64 - v.leading_zeros()) as u8
}

fn packed_len(width: u8, len: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(len)
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| HdtError::decode(format!("LogArray of {len} x {width} bits is too large")))
}

#[inline]
fn mask(w: usize) -> u64 {
    if w >= 64 { u64::MAX } else { (1u64 << w) - 1 }
}

/// 64-bit little-endian word `k` of `data`, zero-padded past the end.
#[inline]
fn read_word(data: &[u8], k: usize) -> u64 {
    let start = k * 8;
    let mut buf = [0u8; 8];
    if start < data.len() {
        let end = (start + 8).min(data.len());
        buf[..end - start].copy_from_slice(&data[start..end]);
    }
    u64::from_le_bytes(buf)
}
