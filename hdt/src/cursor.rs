//! Bounds-checked reads over an immutable byte region.

use crate::error::HdtError;
use crate::vbyte::read_vbyte;
use crate::Result;

/// Forward-only reader over a byte slice. Every read fails with
/// [`HdtError::Decode`] instead of reading out of bounds.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| HdtError::decode(format!("unexpected end of data at offset {}", self.pos)))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_vbyte(&mut self) -> Result<u64> {
        let (v, next) = read_vbyte(self.buf, self.pos)?;
        self.pos = next;
        Ok(v)
    }

    /// Read a vbyte that must fit in `usize`.
    pub fn read_vbyte_usize(&mut self) -> Result<usize> {
        let v = self.read_vbyte()?;
        usize::try_from(v).map_err(|_| HdtError::decode(format!("value {v} does not fit in usize")))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or_else(|| {
                HdtError::decode(format!(
                    "need {n} bytes at offset {}, only {} available",
                    self.pos,
                    self.remaining()
                ))
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Read a NUL-terminated string; the terminator is consumed but not returned.
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let rest = self.buf.get(self.pos..).unwrap_or_default();
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| HdtError::decode(format!("unterminated string at offset {}", self.pos)))?;
        let out = &rest[..len];
        self.pos += len + 1;
        Ok(out)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_sequence() {
        let data = [7u8, b'a', b'b', 0, 0x81, 0x12, 0x34, 0xde, 0xad, 0xbe, 0xef];
        let mut r = ByteReader::new(&data, 0);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_cstr().unwrap(), b"ab");
        assert_eq!(r.read_vbyte().unwrap(), 1);
        assert_eq!(r.read_u16_be().unwrap(), 0x1234);
        assert_eq!(r.read_u32_be().unwrap(), 0xdead_beef);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn overruns_are_errors() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data, 2);
        assert!(r.read_u16_be().is_err());
        assert!(r.read_cstr().is_err());
        assert!(matches!(r.read_bytes(usize::MAX), Err(HdtError::Decode(_))));
        let mut past = ByteReader::new(&data, 10);
        assert!(past.read_u8().is_err());
        assert!(past.read_cstr().is_err());
    }
}
