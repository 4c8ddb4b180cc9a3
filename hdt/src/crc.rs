//! Checksums used by HDT sections.
//!
//! - CRC-8 (poly 0x07, init 0) over small headers
//! - CRC-16/ARC over control information
//! - CRC-32C (Castagnoli) over bulk data

/// Compute CRC-8 (polynomial 0x07, no reflection, init 0).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &b in data {
        crc ^= b;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x07;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Compute CRC-16/ARC (reflected polynomial 0xA001, init 0).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in data {
        crc ^= u16::from(b);
        for _ in 0..8 {
            let lsb = crc & 1;
            crc >>= 1;
            if lsb != 0 {
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Compute CRC-32C (reflected polynomial 0x82F63B78).
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &b in data {
        let mut x = (crc ^ u32::from(b)) & 0xFF;
        for _ in 0..8 {
            let lsb = x & 1;
            x >>= 1;
            if lsb != 0 {
                x ^= 0x82F6_3B78;
            }
        }
        crc = (crc >> 8) ^ x;
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_values() {
        let input = b"123456789";
        assert_eq!(crc8(input), 0xF4);
        assert_eq!(crc16(input), 0xBB3D);
        assert_eq!(crc32(input), 0xE306_9283);
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc8(&[]), 0);
        assert_eq!(crc16(&[]), 0);
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn single_bit_flip_changes_every_checksum() {
        let data = b"<http://example.org/s> <http://example.org/p> \"o\" .".to_vec();
        for bit in 0..data.len() * 8 {
            let mut flipped = data.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(crc8(&data), crc8(&flipped));
            assert_ne!(crc16(&data), crc16(&flipped));
            assert_ne!(crc32(&data), crc32(&flipped));
        }
    }
}
