//! CRC-8 used to protect FLAC frame headers.
//!
//! Polynomial `x^8 + x^2 + x + 1` (0x07), initial value 0, no reflection.

const POLYNOMIAL: u8 = 0x07;

const TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-8 of `bytes`.
pub fn crc8(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |crc, &b| TABLE[(crc ^ b) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_headers() {
        assert_eq!(crc8(&[0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00]), 0xBF);
        assert_eq!(crc8(&[0xFF, 0xF8, 0x69, 0x98, 0x00, 0x0F]), 0x99);
        assert_eq!(crc8(&[0xFF, 0xF8, 0xC9, 0xA8, 0x20]), 0x6D);
    }

    #[test]
    fn test_check_value() {
        // CRC-8/SMBUS check value
        assert_eq!(crc8(b"123456789"), 0xF4);
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn test_appending_crc_gives_zero() {
        let mut bytes = vec![0xFF, 0xF8, 0x30, 0x08, 0x00];
        bytes.push(crc8(&bytes));
        assert_eq!(crc8(&bytes), 0);
    }
}
