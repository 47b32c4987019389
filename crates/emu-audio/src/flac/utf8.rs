//! FLAC's "UTF-8" coded integers.
//!
//! Frame headers store the frame or sample number with the same leading-byte
//! scheme as UTF-8, but encoding a raw integer rather than a code point.
//! Lead bytes from `0xxxxxxx` (7 bits) to `1111110x` (31 bits) are accepted.

use crate::error::Utf8Error;

/// Longest accepted encoding.
pub const MAX_ENCODED_LENGTH: usize = 6;

/// Decode a coded integer from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied. On failure the
/// error reports how many bytes were examined.
///
/// # Panics
///
/// Panics if `bytes` is empty.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), Utf8Error> {
    assert!(!bytes.is_empty(), "needs at least 1 byte to read a number");

    let lead = bytes[0];
    let (continuation, lead_bits) = match lead {
        b if b & 0x80 == 0 => return Ok((u64::from(b), 1)),
        b if b & 0xE0 == 0xC0 => (1, b & 0x1F),
        b if b & 0xF0 == 0xE0 => (2, b & 0x0F),
        b if b & 0xF8 == 0xF0 => (3, b & 0x07),
        b if b & 0xFC == 0xF8 => (4, b & 0x03),
        b if b & 0xFE == 0xFC => (5, b & 0x01),
        _ => return Err(Utf8Error::Unsupported { consumed: 1 }),
    };
    let mut value = u64::from(lead_bits);

    if bytes.len() - 1 < continuation {
        return Err(Utf8Error::NotEnoughBytes { consumed: 1 });
    }

    for (i, &b) in bytes[1..=continuation].iter().enumerate() {
        if b & 0xC0 != 0x80 {
            return Err(Utf8Error::BadEncoding { consumed: i + 2 });
        }
        value = (value << 6) | u64::from(b & 0x3F);
    }

    Ok((value, continuation + 1))
}

/// Encode `value` in the shortest form.
///
/// Returns `None` if the value needs more than 31 bits.
pub fn encode(value: u64) -> Option<Vec<u8>> {
    let continuation = match value {
        0..=0x7F => return Some(vec![value as u8]),
        0x80..=0x7FF => 1,
        0x800..=0xFFFF => 2,
        0x1_0000..=0x1F_FFFF => 3,
        0x20_0000..=0x3FF_FFFF => 4,
        0x400_0000..=0x7FFF_FFFF => 5,
        _ => return None,
    };

    let lead_marker = !(0xFFu8 >> (continuation + 1));
    let mut out = Vec::with_capacity(continuation + 1);
    out.push(lead_marker | (value >> (6 * continuation)) as u8);
    for shift in (0..continuation).rev() {
        out.push(0x80 | ((value >> (6 * shift)) & 0x3F) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &[(&[u8], u64)] = &[
        (&[0x7F], 0x7F),
        (&[0xC2, 0xA2], 0xA2),
        (&[0xC2, 0x80], 0x80),
        (&[0xDF, 0xBF], 0x7FF),
        (&[0xE2, 0x82, 0xAC], 0x20AC),
        (&[0xE0, 0xA0, 0x80], 0x800),
        (&[0xEF, 0xBF, 0xBF], 0xFFFF),
        (&[0xF0, 0x90, 0x80, 0x80], 0x10000),
        (&[0xF7, 0xBF, 0xBF, 0xBF], 0x1FFFFF),
        (&[0xF0, 0xA4, 0xAD, 0xA2], 0x24B62),
        (&[0xF8, 0x88, 0x80, 0x80, 0x80], 0x200000),
        (&[0xFB, 0xBF, 0xBF, 0xBF, 0xBF], 0x3FFFFFF),
        (&[0xFC, 0x84, 0x80, 0x80, 0x80, 0x80], 0x4000000),
        (&[0xFD, 0xBF, 0xBF, 0xBF, 0xBF, 0xBF], 0x7FFFFFFF),
    ];

    #[test]
    fn test_decode_table() {
        for (bytes, expected) in VALID {
            let (value, consumed) = decode(bytes).unwrap();
            assert_eq!(value, *expected, "decoding {bytes:02X?}");
            assert_eq!(consumed, bytes.len(), "consumed for {bytes:02X?}");
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        assert_eq!(decode(&[0xC2, 0xA2, 0xFF, 0xFF]).unwrap(), (0xA2, 2));
    }

    #[test]
    fn test_unsupported_lead() {
        assert_eq!(
            decode(&[0b1111_1110]),
            Err(Utf8Error::Unsupported { consumed: 1 })
        );
        assert_eq!(
            decode(&[0b1000_0000, 0x80]),
            Err(Utf8Error::Unsupported { consumed: 1 })
        );
    }

    #[test]
    fn test_not_enough_bytes() {
        assert_eq!(
            decode(&[0b1110_1111, 0b1011_1111]),
            Err(Utf8Error::NotEnoughBytes { consumed: 1 })
        );
    }

    #[test]
    fn test_bad_encoding() {
        assert_eq!(
            decode(&[0b1110_1111, 0b1111_1111, 0b1011_1111]),
            Err(Utf8Error::BadEncoding { consumed: 2 })
        );
    }

    #[test]
    #[should_panic(expected = "at least 1 byte")]
    fn test_empty_panics() {
        let _ = decode(&[]);
    }

    #[test]
    fn test_encode_matches_table() {
        for (bytes, value) in VALID {
            assert_eq!(encode(*value).as_deref(), Some(*bytes));
        }
        assert_eq!(encode(0x20AC).unwrap(), vec![0xE2, 0x82, 0xAC]);
        assert_eq!(encode(137_676).unwrap(), vec![0xF0, 0xA1, 0xA7, 0x8C]);
        assert_eq!(encode(0x8000_0000), None);
    }
}
