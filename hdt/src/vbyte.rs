//! Variable-length unsigned integers as laid out in HDT files.
//!
//! Seven data bits per byte, least significant group first. Unlike LEB128
//! the *final* byte of a value carries the high bit; every byte before it
//! has the high bit clear.

use crate::error::HdtError;
use crate::Result;

/// Longest encoding of a `u64`.
pub const MAX_VBYTE_LEN: usize = 10;

/// Append the encoding of `v` to `out`.
pub fn push_vbyte(mut v: u64, out: &mut Vec<u8>) {
    loop {
        let b = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(b | 0x80);
            break;
        }
        out.push(b);
    }
}

/// Number of bytes [`push_vbyte`] would emit for `v`.
pub fn vbyte_len(v: u64) -> usize {
    let bits = 64 - v.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode one value starting at `off`; returns the value and the offset just
/// past it.
pub fn read_vbyte(buf: &[u8], mut off: usize) -> Result<(u64, usize)> {
    let mut x = 0u64;
    for i in 0..MAX_VBYTE_LEN {
        let b = *buf
            .get(off)
            .ok_or_else(|| HdtError::decode(format!("truncated vbyte at offset {off}")))?;
        off += 1;
        let group = u64::from(b & 0x7f);
        let shift = 7 * i as u32;
        if shift == 63 && group > 1 {
            return Err(HdtError::decode("vbyte overflows 64 bits"));
        }
        x |= group << shift;
        if b & 0x80 != 0 {
            return Ok((x, off));
        }
    }
    Err(HdtError::decode("vbyte longer than 10 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn final_byte_carries_high_bit() {
        let mut buf = Vec::new();
        push_vbyte(5, &mut buf);
        assert_eq!(buf, vec![0x85]);
        buf.clear();
        push_vbyte(300, &mut buf);
        // 300 = 0b10_0101100 -> low group 0x2c (clear), high group 0x02 (set)
        assert_eq!(buf, vec![0x2c, 0x82]);
        assert_eq!(read_vbyte(&buf, 0).unwrap(), (300, 2));
    }

    #[test]
    fn roundtrip_and_bounds() {
        let mut buf = Vec::new();
        for &n in &[0, 1, 127, 128, 255, 16384, u32::MAX as u64, u64::MAX] {
            buf.clear();
            push_vbyte(n, &mut buf);
            assert_eq!(buf.len(), vbyte_len(n));
            let (v, off) = read_vbyte(&buf, 0).unwrap();
            assert_eq!(v, n);
            assert_eq!(off, buf.len());
        }
        assert!(read_vbyte(&[], 0).is_err());
        // continuation bytes only: must stop, not spin
        assert!(read_vbyte(&[0x01; 32], 0).is_err());
        assert!(read_vbyte(&[0x01, 0x01], 0).is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(n in any::<u64>()) {
            let mut buf = Vec::new();
            push_vbyte(n, &mut buf);
            prop_assert_eq!(read_vbyte(&buf, 0).unwrap(), (n, buf.len()));
        }

        #[test]
        fn arbitrary_bytes_terminate(bytes in proptest::collection::vec(any::<u8>(), 0..24)) {
            // Never panics and never reads past MAX_VBYTE_LEN bytes.
            if let Ok((_, off)) = read_vbyte(&bytes, 0) {
                prop_assert!(off <= MAX_VBYTE_LEN);
            }
        }
    }
}
