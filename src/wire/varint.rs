//! Variable-length integer encoding and the zigzag transform.
//!
//! Each byte carries 7 bits of magnitude in little-endian order plus a
//! continuation flag in bit 7. An unsigned 32-bit varint occupies 1-5 bytes;
//! a 64-bit varint occupies 1-10.

/// Maximum bytes for a 64-bit varint (ceil(64 / 7) = 10).
pub const MAX_VARINT64_BYTES: usize = 10;

/// Maximum bytes for a 32-bit varint.
pub const MAX_VARINT32_BYTES: usize = 5;

/// Encoded byte length of a 32-bit varint.
pub const fn size32(value: u32) -> usize {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else if value < 0x20_0000 {
        3
    } else if value < 0x1000_0000 {
        4
    } else {
        5
    }
}

/// Encoded byte length of a 64-bit varint.
pub const fn size64(value: u64) -> usize {
    // 7 bits per byte; value 0 still takes one byte.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Append a 32-bit varint to `out`.
pub fn write32(value: u32, out: &mut Vec<u8>) {
    write64(value as u64, out);
}

/// Append a 64-bit varint to `out`.
pub fn write64(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Zigzag-fold a signed 32-bit integer: small magnitudes stay short.
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Reverse of [`zigzag32`].
pub const fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zigzag-fold a signed 64-bit integer.
pub const fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Reverse of [`zigzag64`].
pub const fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size32_boundaries() {
        assert_eq!(size32(0), 1);
        assert_eq!(size32(127), 1);
        assert_eq!(size32(128), 2);
        assert_eq!(size32(16_383), 2);
        assert_eq!(size32(16_384), 3);
        assert_eq!(size32(u32::MAX), 5);
    }

    #[test]
    fn test_size64_matches_written_bytes() {
        for value in [0u64, 1, 127, 128, 300, 1 << 21, 1 << 35, u64::MAX] {
            let mut buf = Vec::new();
            write64(value, &mut buf);
            assert_eq!(buf.len(), size64(value), "value {value}");
        }
    }

    #[test]
    fn test_write64_continuation_bits() {
        let mut buf = Vec::new();
        write64(300, &mut buf);
        // 300 = 0b10_0101100 -> AC 02
        assert_eq!(buf, [0xac, 0x02]);
    }

    #[test]
    fn test_zigzag32_known_values() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(-2), 3);
        assert_eq!(zigzag32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
    }

    #[test]
    fn test_zigzag_round_trip() {
        for value in [i32::MIN, -65, -1, 0, 1, 64, i32::MAX] {
            assert_eq!(unzigzag32(zigzag32(value)), value);
        }
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(unzigzag64(zigzag64(value)), value);
        }
    }
}
