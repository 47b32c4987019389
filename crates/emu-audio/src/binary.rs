//! Bit-field helpers for big-endian fields that straddle byte boundaries.

/// Largest value representable in 36 bits.
pub const U36_MAX: u64 = (1 << 36) - 1;

/// Extract `width` bits from `bytes`, after skipping `skip` leading bits.
///
/// Bits are numbered most-significant first. Trailing bits past the field
/// are ignored.
///
/// # Panics
///
/// Panics if the field does not fit in `bytes` or `width` exceeds 64.
pub fn read_bits(bytes: &[u8], skip: u32, width: u32) -> u64 {
    assert!(width <= 64, "cannot read {width} bits into a u64");
    let needed = (skip + width).div_ceil(8) as usize;
    assert!(
        bytes.len() >= needed,
        "bit field needs {needed} bytes, have {}",
        bytes.len()
    );

    let mut value = 0u64;
    for bit in skip..skip + width {
        let byte = bytes[(bit / 8) as usize];
        let set = (byte >> (7 - bit % 8)) & 1;
        value = (value << 1) | u64::from(set);
    }
    value
}

/// Overwrite `width` bits of `bytes` after skipping `skip` leading bits.
///
/// Bits outside the field keep their current values.
///
/// # Panics
///
/// Panics if the field does not fit in `bytes`, or `value` needs more than
/// `width` bits.
pub fn write_bits(bytes: &mut [u8], skip: u32, width: u32, value: u64) {
    assert!(
        width == 64 || value >> width == 0,
        "value {value} does not fit in {width} bits"
    );
    let needed = (skip + width).div_ceil(8) as usize;
    assert!(
        bytes.len() >= needed,
        "bit field needs {needed} bytes, have {}",
        bytes.len()
    );

    for (i, bit) in (skip..skip + width).enumerate() {
        let set = ((value >> (width - 1 - i as u32)) & 1) as u8;
        let shift = 7 - bit % 8;
        let byte = &mut bytes[(bit / 8) as usize];
        *byte = (*byte & !(1 << shift)) | (set << shift);
    }
}

/// Read a 36-bit value from 5 bytes, ignoring the first nibble.
pub fn read_u36_ignoring_first_nibble(bytes: &[u8]) -> u64 {
    read_bits(bytes, 4, 36)
}

/// Write a 36-bit value to 5 bytes, preserving the first nibble.
pub fn write_u36_preserving_first_nibble(bytes: &mut [u8], value: u64) {
    write_bits(bytes, 4, 36, value)
}

/// Read a 20-bit value from 3 bytes, ignoring the last nibble.
pub fn read_u20_ignoring_last_nibble(bytes: &[u8]) -> u32 {
    read_bits(bytes, 0, 20) as u32
}

/// Read a big-endian 24-bit value.
pub fn read_u24_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Read a little-endian `u16` at `offset`.
pub fn u16_le_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a little-endian `u32` at `offset`.
pub fn u32_le_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Decode ASCII text, dropping trailing NUL bytes.
///
/// Bytes outside the ASCII range are replaced.
pub fn ascii_trim_nul(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    bytes[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u36() {
        assert_eq!(read_u36_ignoring_first_nibble(&[0xFF, 0, 0, 0, 0x01]), 0xF_0000_0001);
        assert_eq!(read_u36_ignoring_first_nibble(&[0xF0, 0, 0, 0, 0]), 0);
        assert_eq!(
            read_u36_ignoring_first_nibble(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            U36_MAX
        );
    }

    #[test]
    fn test_write_u36_keeps_nibble() {
        let mut bytes = [0xA5, 0, 0, 0, 0];
        write_u36_preserving_first_nibble(&mut bytes, 0x1_2345_6789);
        assert_eq!(bytes, [0xA1, 0x23, 0x45, 0x67, 0x89]);
        assert_eq!(read_u36_ignoring_first_nibble(&bytes), 0x1_2345_6789);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_write_u36_overflow() {
        let mut bytes = [0u8; 5];
        write_u36_preserving_first_nibble(&mut bytes, U36_MAX + 1);
    }

    #[test]
    fn test_read_u20() {
        // 44100 << 4 with a trailing nibble of channel bits
        assert_eq!(read_u20_ignoring_last_nibble(&[0x0A, 0xC4, 0x42]), 44100);
    }

    #[test]
    fn test_read_bits_mid_byte() {
        // bits 7..12 of 0b0000_0001_1111_0000 are 11111
        assert_eq!(read_bits(&[0x01, 0xF0], 7, 5), 0b11111);
        assert_eq!(read_bits(&[0x0F], 4, 3), 0b111);
    }

    #[test]
    fn test_u24() {
        assert_eq!(read_u24_be(&[0x00, 0x00, 0x22]), 34);
        assert_eq!(read_u24_be(&[0x12, 0x34, 0x56]), 0x123456);
    }

    #[test]
    fn test_ascii_trim_nul() {
        assert_eq!(ascii_trim_nul(b"MARK_01\0\0"), "MARK_01");
        assert_eq!(ascii_trim_nul(b"\0\0"), "");
        assert_eq!(ascii_trim_nul(b"a\0b\0"), "a\0b");
    }
}
