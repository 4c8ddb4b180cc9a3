//! Bit sequences (type 1) used as adjacency demarcation in bitmap triples.
//!
//! ```text
//! type:u8 (=1) | bitCount:vbyte | crc8 | bytes[ceil(bitCount/8)] (LSB-first) | crc32:u32 (BE)
//! ```
//!
//! The bits stay in the file image. A sampled rank directory (one count per
//! 512 bits) is built on open and bounds `select1` to one superblock scan.

use std::ops::Range;

use bitvec::{order::Lsb0, slice::BitSlice};

use crate::Result;
use crate::crc::{crc8, crc32};
use crate::cursor::ByteReader;
use crate::error::HdtError;
use crate::vbyte::push_vbyte;

pub const BITMAP_TYPE: u8 = 1;

const SUPERBLOCK: usize = 512;

/// A parsed bitmap. Like [`crate::log_array::LogArray`] it holds only the
/// location of its bits; queries take the backing bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    len: usize,
    ones: usize,
    data: Range<usize>,
    /// Set bits before the start of each superblock.
    ranks: Vec<usize>,
}

impl Bitmap {
    /// Parse and verify a bitmap at `offset`; returns it with the number of
    /// bytes consumed.
    pub fn parse(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(bytes, offset);
        let ty = r.read_u8()?;
        if ty != BITMAP_TYPE {
            return Err(HdtError::decode(format!(
                "expected bitmap type {BITMAP_TYPE} at offset {offset}, found {ty}"
            )));
        }
        let len = r.read_vbyte_usize()?;
        let header_end = r.pos();
        let stored8 = r.read_u8()?;
        let computed8 = crc8(&bytes[offset..header_end]);
        if stored8 != computed8 {
            return Err(HdtError::Checksum {
                section: "bitmap header",
                stored: u32::from(stored8),
                computed: u32::from(computed8),
            });
        }
        let start = r.pos();
        let data = r.read_bytes(len.div_ceil(8))?;
        let stored32 = r.read_u32_be()?;
        let computed32 = crc32(data);
        if stored32 != computed32 {
            return Err(HdtError::Checksum {
                section: "bitmap data",
                stored: stored32,
                computed: computed32,
            });
        }
        let bits = BitSlice::<u8, Lsb0>::from_slice(data)
            .get(..len)
            .ok_or_else(|| HdtError::decode(format!("bitmap of {len} bits is truncated")))?;
        let mut ranks = Vec::with_capacity(len.div_ceil(SUPERBLOCK));
        let mut ones = 0;
        for chunk in bits.chunks(SUPERBLOCK) {
            ranks.push(ones);
            ones += chunk.count_ones();
        }
        let bm = Bitmap {
            len,
            ones,
            data: start..start + data.len(),
            ranks,
        };
        Ok((bm, r.pos() - offset))
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    fn bits<'b>(&self, bytes: &'b [u8]) -> Option<&'b BitSlice<u8, Lsb0>> {
        let data = bytes.get(self.data.clone())?;
        BitSlice::<u8, Lsb0>::from_slice(data).get(..self.len)
    }

    /// Bit `i`, or `None` when `i` is out of range or `bytes` is not the
    /// image this bitmap was parsed from.
    pub fn get(&self, bytes: &[u8], i: usize) -> Option<bool> {
        self.bits(bytes)?.get(i).map(|b| *b)
    }

    /// Number of set bits strictly before position `i`.
    pub fn rank1(&self, bytes: &[u8], i: usize) -> Option<usize> {
        if i >= self.len {
            return Some(self.ones);
        }
        let block = i / SUPERBLOCK;
        let before = *self.ranks.get(block)?;
        Some(before + self.bits(bytes)?.get(block * SUPERBLOCK..i)?.count_ones())
    }

    /// Position of the `k`-th set bit (0-based).
    pub fn select1(&self, bytes: &[u8], k: usize) -> Option<u64> {
        if k >= self.ones {
            return None;
        }
        // last superblock whose preceding count does not exceed k
        let block = self.ranks.partition_point(|&r| r <= k).checked_sub(1)?;
        let start = block * SUPERBLOCK;
        let end = (start + SUPERBLOCK).min(self.len);
        self.bits(bytes)?
            .get(start..end)?
            .iter_ones()
            .nth(k - self.ranks[block])
            .map(|i| (start + i) as u64)
    }

    /// Position of the first set bit at or after `i`.
    #[inline]
    pub fn next_one(&self, bytes: &[u8], i: usize) -> Option<u64> {
        self.select1(bytes, self.rank1(bytes, i)?)
    }

    /// Encode `bits` as a bitmap; returns the number of bytes written.
    pub fn encode(bits: &[bool], out: &mut Vec<u8>) -> usize {
        let start = out.len();
        out.push(BITMAP_TYPE);
        push_vbyte(bits.len() as u64, out);
        let c8 = crc8(&out[start..]);
        out.push(c8);
        let mut data = vec![0u8; bits.len().div_ceil(8)];
        let view = BitSlice::<u8, Lsb0>::from_slice_mut(&mut data);
        for (i, _) in bits.iter().enumerate().filter(|(_, b)| **b) {
            view.set(i, true);
        }
        out.extend_from_slice(&data);
        out.extend_from_slice(&crc32(&data).to_be_bytes());
        out.len() - start
    }
}
