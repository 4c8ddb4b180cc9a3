//! One front-coded dictionary partition (plain front coding, section type 2).
//!
//! ```text
//! type:u8 (=2) | count:vbyte | dataLen:vbyte | blockSize:vbyte | crc8
//! LogArray of block offsets
//! data[dataLen] | crc32:u32 (BE)
//! ```
//!
//! Every block holds up to `blockSize` strings. The first is stored whole and
//! NUL-terminated; each following string is `vbyte(sharedPrefixLen)` plus its
//! NUL-terminated suffix, relative to the string immediately before it.

use std::ops::Range;

use crate::Result;
use crate::crc::{crc8, crc32};
use crate::cursor::ByteReader;
use crate::error::HdtError;
use crate::log_array::LogArray;
use crate::vbyte::push_vbyte;

pub const PFC_SECTION_TYPE: u8 = 2;

/// Location and shape of a parsed partition. String access takes the file
/// bytes the partition was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictSection {
    count: usize,
    block_size: usize,
    /// Start of each block relative to `data`, plus the end of the last one.
    blocks: Vec<usize>,
    data: Range<usize>,
}

impl DictSection {
    /// Parse and verify a partition at `offset`; returns it with the number
    /// of bytes consumed.
    pub fn parse(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(bytes, offset);
        let ty = r.read_u8()?;
        if ty != PFC_SECTION_TYPE {
            return Err(HdtError::format(format!(
                "unsupported dictionary section type {ty} at offset {offset}"
            )));
        }
        let count = r.read_vbyte_usize()?;
        let data_len = r.read_vbyte_usize()?;
        let block_size = r.read_vbyte_usize()?;
        let header_end = r.pos();
        let stored8 = r.read_u8()?;
        let computed8 = crc8(&bytes[offset..header_end]);
        if stored8 != computed8 {
            return Err(HdtError::Checksum {
                section: "dictionary section header",
                stored: u32::from(stored8),
                computed: u32::from(computed8),
            });
        }
        if block_size == 0 && count > 0 {
            return Err(HdtError::decode("dictionary section with block size 0"));
        }
        let nblocks = if count == 0 {
            0
        } else {
            count.div_ceil(block_size)
        };

        let (offsets, used) = LogArray::parse(bytes, r.pos())?;
        r.read_bytes(used)?;
        let mut blocks = offsets
            .to_vec(bytes)?
            .into_iter()
            .map(|o| usize::try_from(o).unwrap_or(usize::MAX))
            .collect::<Vec<_>>();
        if blocks.len() == nblocks {
            blocks.push(data_len);
        } else if blocks.len() != nblocks + 1 {
            return Err(HdtError::decode(format!(
                "dictionary section has {} block offsets for {nblocks} blocks",
                blocks.len()
            )));
        }
        if blocks.windows(2).any(|w| w[0] > w[1]) || blocks.iter().any(|&b| b > data_len) {
            return Err(HdtError::decode(
                "dictionary block offsets out of order or out of bounds",
            ));
        }
        if blocks.last() != Some(&data_len) {
            return Err(HdtError::decode(format!(
                "dictionary block offsets end at {:?}, data is {data_len} bytes",
                blocks.last()
            )));
        }

        let start = r.pos();
        let data = r.read_bytes(data_len)?;
        let stored32 = r.read_u32_be()?;
        let computed32 = crc32(data);
        if stored32 != computed32 {
            return Err(HdtError::Checksum {
                section: "dictionary section data",
                stored: stored32,
                computed: computed32,
            });
        }
        log::debug!(
            "dictionary section at {offset}: {count} strings, {nblocks} blocks of {block_size}, {data_len} bytes"
        );
        let section = DictSection {
            count,
            block_size,
            blocks,
            data: start..start + data_len,
        };
        Ok((section, r.pos() - offset))
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// String at 0-based `index`.
    pub fn string(&self, bytes: &[u8], index: usize) -> Result<String> {
        let mut found = None;
        self.scan_block(bytes, index / self.block_size.max(1), Some(index), |i, s| {
            if i == index {
                found = Some(s.to_string());
            }
        })?;
        found.ok_or_else(|| HdtError::decode(format!("string {index} not found in its block")))
    }

    /// Decode block `block` in order, calling `f(index, string)` for each
    /// string up to and including `until` (or the end of the block).
    pub fn scan_block(
        &self,
        bytes: &[u8],
        block: usize,
        until: Option<usize>,
        mut f: impl FnMut(usize, &str),
    ) -> Result<()> {
        if block >= self.num_blocks() {
            return Err(HdtError::decode(format!(
                "block {block} out of range ({} blocks)",
                self.num_blocks()
            )));
        }
        let first = block * self.block_size;
        let block_last = ((block + 1) * self.block_size).min(self.count) - 1;
        let last = until.map_or(block_last, |u| u.min(block_last));
        let start = self.data.start + self.blocks[block];
        let end = self.data.start + self.blocks[block + 1];
        let region = bytes
            .get(start..end)
            .ok_or_else(|| HdtError::decode(format!("block {block} outside the file image")))?;
        // A reader over only this block turns any overrun into a Decode error.
        let mut r = ByteReader::new(region, 0);
        let mut cur: Vec<u8> = Vec::new();
        for index in first..=last {
            if index == first {
                cur.extend_from_slice(r.read_cstr()?);
            } else {
                let shared = r.read_vbyte_usize()?;
                if shared > cur.len() {
                    return Err(HdtError::decode(format!(
                        "shared prefix {shared} longer than previous string ({} bytes) in block {block}",
                        cur.len()
                    )));
                }
                cur.truncate(shared);
                cur.extend_from_slice(r.read_cstr()?);
            }
            let s = std::str::from_utf8(&cur).map_err(|_| {
                HdtError::decode(format!("dictionary string {index} is not UTF-8"))
            })?;
            f(index, s);
        }
        if last == block_last && r.remaining() != 0 {
            return Err(HdtError::decode(format!(
                "block {block} has {} bytes after its last string",
                r.remaining()
            )));
        }
        Ok(())
    }

    /// Sequential scan of every string in order.
    pub fn iter<'a>(&'a self, bytes: &'a [u8]) -> SectionIter<'a> {
        SectionIter {
            section: self,
            bytes,
            block: 0,
            buf: Vec::new(),
            pos: 0,
            failed: false,
        }
    }

    /// Binary search for `needle` among the block heads, then scan that
    /// block. Only meaningful for partitions sorted in byte order.
    pub fn locate(&self, bytes: &[u8], needle: &str) -> Result<Option<usize>> {
        let nblocks = self.num_blocks();
        if nblocks == 0 {
            return Ok(None);
        }
        let (mut lo, mut hi) = (0usize, nblocks);
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            let head = self.string(bytes, mid * self.block_size)?;
            if head.as_bytes() <= needle.as_bytes() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mut found = None;
        self.scan_block(bytes, lo, None, |i, s| {
            if found.is_none() && s == needle {
                found = Some(i);
            }
        })?;
        Ok(found)
    }

    /// Encode sorted `strings` as a partition; returns the bytes written.
    pub fn encode<S: AsRef<str>>(strings: &[S], block_size: usize, out: &mut Vec<u8>) -> Result<usize> {
        if block_size == 0 {
            return Err(HdtError::Invalid("dictionary block size must be positive".into()));
        }
        let mut data = Vec::new();
        let mut offsets = Vec::with_capacity(strings.len() / block_size + 2);
        let mut prev: &[u8] = &[];
        for (i, s) in strings.iter().enumerate() {
            let s = s.as_ref().as_bytes();
            if s.contains(&0) {
                return Err(HdtError::Invalid(format!(
                    "term {:?} contains a NUL byte",
                    String::from_utf8_lossy(s)
                )));
            }
            if i % block_size == 0 {
                offsets.push(data.len() as u64);
                data.extend_from_slice(s);
            } else {
                let shared = common_prefix(prev, s);
                push_vbyte(shared as u64, &mut data);
                data.extend_from_slice(&s[shared..]);
            }
            data.push(0);
            prev = s;
        }
        offsets.push(data.len() as u64);

        let start = out.len();
        out.push(PFC_SECTION_TYPE);
        push_vbyte(strings.len() as u64, out);
        push_vbyte(data.len() as u64, out);
        push_vbyte(block_size as u64, out);
        let c8 = crc8(&out[start..]);
        out.push(c8);
        LogArray::encode(&offsets, out);
        out.extend_from_slice(&data);
        out.extend_from_slice(&crc32(&data).to_be_bytes());
        Ok(out.len() - start)
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Sequential scan over a partition, one block decoded at a time.
#[derive(Debug)]
pub struct SectionIter<'a> {
    section: &'a DictSection,
    bytes: &'a [u8],
    block: usize,
    buf: Vec<String>,
    pos: usize,
    failed: bool,
}

impl Iterator for SectionIter<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.pos >= self.buf.len() {
            if self.block >= self.section.num_blocks() {
                return None;
            }
            self.buf.clear();
            self.pos = 0;
            let buf = &mut self.buf;
            let res = self
                .section
                .scan_block(self.bytes, self.block, None, |_, s| buf.push(s.to_string()));
            self.block += 1;
            if let Err(e) = res {
                self.failed = true;
                return Some(Err(e));
            }
        }
        let s = std::mem::take(&mut self.buf[self.pos]);
        self.pos += 1;
        Some(Ok(s))
    }
}
