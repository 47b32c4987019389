//! FLAC frame header decoding.
//!
//! ```text
//! sync(14) reserved(1) blocking(1) | block size(4) sample rate(4) |
//! channels(4) bit depth(3) reserved(1) | coded number(8-48) |
//! [block size ext(8|16)] [sample rate ext(8|16)] | crc8(8)
//! ```

use super::crc::crc8;
use super::utf8;
use crate::{Error, Result};
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::Cursor;

/// The 14-bit frame sync code.
pub const SYNC_CODE: u16 = 0b11_1111_1111_1110;

/// First byte of every frame.
pub const SYNC_BYTE_ONE: u8 = 0xFF;

/// Second byte of a fixed blocking frame.
pub const SYNC_BYTE_TWO_FIXED: u8 = 0xF8;

/// Second byte of a variable blocking frame.
pub const SYNC_BYTE_TWO_VARIABLE: u8 = 0xF9;

/// Largest possible frame header: 4 fixed bytes, a 7-byte coded number,
/// two 16-bit extensions and the CRC.
pub const MAX_HEADER_SIZE: usize = 16;

const FIXED_FIELDS_LENGTH: usize = 4;

/// How block sizes vary between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockingStrategy {
    /// Every frame but the last has the same block size; frames carry a
    /// frame number.
    Fixed,
    /// Block sizes vary; frames carry their starting sample number.
    Variable,
}

/// Channel layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelAssignment {
    Mono,
    LeftRight,
    LeftRightCenter,
    /// Front left, front right, back left, back right.
    Quad,
    /// Front left, front right, front center, back left, back right.
    Surround5,
    /// 5 channels plus LFE.
    Surround5_1,
    /// Front left, front right, front center, LFE, back center, side left,
    /// side right.
    Surround6_1,
    /// Front left, front right, front center, LFE, back left, back right,
    /// side left, side right.
    Surround7_1,
    /// Left plus side stereo.
    LeftSide,
    /// Right plus side stereo.
    RightSide,
    /// Mid plus side stereo.
    MidSide,
}

impl ChannelAssignment {
    /// Decode a 4-bit channel assignment code. Codes 11 to 15 are reserved.
    pub fn from_code(code: u8) -> Option<Self> {
        let assignment = match code {
            0 => Self::Mono,
            1 => Self::LeftRight,
            2 => Self::LeftRightCenter,
            3 => Self::Quad,
            4 => Self::Surround5,
            5 => Self::Surround5_1,
            6 => Self::Surround6_1,
            7 => Self::Surround7_1,
            8 => Self::LeftSide,
            9 => Self::RightSide,
            10 => Self::MidSide,
            _ => return None,
        };
        Some(assignment)
    }

    /// Number of channels.
    pub fn channels(&self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::LeftRight | Self::LeftSide | Self::RightSide | Self::MidSide => 2,
            Self::LeftRightCenter => 3,
            Self::Quad => 4,
            Self::Surround5 => 5,
            Self::Surround5_1 => 6,
            Self::Surround6_1 => 7,
            Self::Surround7_1 => 8,
        }
    }
}

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameHeader {
    pub blocking_strategy: BlockingStrategy,
    /// Samples per channel in the frame.
    pub block_size: u32,
    /// Sample rate in Hz, from the header or from STREAMINFO.
    pub sample_rate: u32,
    pub channel_assignment: ChannelAssignment,
    /// Bits per sample, from the header or from STREAMINFO.
    pub bit_depth: u8,
    /// Frame number for fixed blocking, starting sample for variable
    /// blocking. See [`frame_number`](Self::frame_number) and
    /// [`starting_sample`](Self::starting_sample).
    pub number: u64,
    /// CRC-8 stored at the end of the header.
    pub crc8: u8,
    /// Auxiliary CRC or flag byte. Frame headers carry no such field, so
    /// parsing leaves it `None`.
    pub auxiliary_crc: Option<u8>,
}

impl FrameHeader {
    /// Parse a frame header at the start of `bytes`.
    ///
    /// `stream_info_sample_rate` and `stream_info_bit_depth` fill in fields
    /// the header defers to STREAMINFO. Returns the header and the number of
    /// header bytes consumed, CRC included.
    pub fn parse(
        bytes: &[u8],
        stream_info_sample_rate: u32,
        stream_info_bit_depth: u8,
    ) -> Result<(Self, usize)> {
        parse_header(bytes, stream_info_sample_rate, stream_info_bit_depth, true)
    }

    /// The frame number, for fixed blocking frames.
    pub fn frame_number(&self) -> Option<u64> {
        match self.blocking_strategy {
            BlockingStrategy::Fixed => Some(self.number),
            BlockingStrategy::Variable => None,
        }
    }

    /// The starting sample, for variable blocking frames.
    pub fn starting_sample(&self) -> Option<u64> {
        match self.blocking_strategy {
            BlockingStrategy::Fixed => None,
            BlockingStrategy::Variable => Some(self.number),
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> u8 {
        self.channel_assignment.channels()
    }
}

/// Check whether two bytes begin a frame sync code.
pub fn is_sync(first: u8, second: u8) -> bool {
    first == SYNC_BYTE_ONE && (second == SYNC_BYTE_TWO_FIXED || second == SYNC_BYTE_TWO_VARIABLE)
}

fn truncated() -> Error {
    Error::invalid_frame_header("header is truncated")
}

fn take_u8(bytes: &[u8], consumed: &mut usize) -> Result<u8> {
    let b = *bytes.get(*consumed).ok_or_else(truncated)?;
    *consumed += 1;
    Ok(b)
}

fn take_u16(bytes: &[u8], consumed: &mut usize) -> Result<u16> {
    let hi = take_u8(bytes, consumed)?;
    let lo = take_u8(bytes, consumed)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

pub(crate) fn parse_header(
    bytes: &[u8],
    stream_info_sample_rate: u32,
    stream_info_bit_depth: u8,
    check_crc: bool,
) -> Result<(FrameHeader, usize)> {
    // 14 sync bits followed by a clear reserved bit
    if bytes.len() < 2 || bytes[0] != SYNC_BYTE_ONE || bytes[1] & 0xFE != SYNC_BYTE_TWO_FIXED {
        return Err(Error::invalid_frame_header(
            "Sync code not found at start of span",
        ));
    }
    if bytes.len() < FIXED_FIELDS_LENGTH {
        return Err(truncated());
    }

    let mut reader = BitReader::endian(Cursor::new(&bytes[..FIXED_FIELDS_LENGTH]), BigEndian);
    let sync: u16 = reader.read(14)?;
    debug_assert_eq!(sync, SYNC_CODE);
    reader.skip(1)?;
    let blocking_strategy = if reader.read_bit()? {
        BlockingStrategy::Variable
    } else {
        BlockingStrategy::Fixed
    };
    let block_size_code: u8 = reader.read(4)?;
    let sample_rate_code: u8 = reader.read(4)?;
    let channel_code: u8 = reader.read(4)?;
    let bit_depth_code: u8 = reader.read(3)?;
    let reserved = reader.read_bit()?;

    let channel_assignment = ChannelAssignment::from_code(channel_code)
        .ok_or_else(|| Error::invalid_frame_header("channel assignment is reserved"))?;

    let bit_depth = match bit_depth_code {
        0 => stream_info_bit_depth,
        1 => 8,
        2 => 12,
        4 => 16,
        5 => 20,
        6 => 24,
        _ => return Err(Error::invalid_frame_header("Bit depth is reserved")),
    };

    if reserved {
        return Err(Error::invalid_frame_header("reserved bit is set"));
    }

    let mut consumed = FIXED_FIELDS_LENGTH;
    if bytes.len() <= consumed {
        return Err(truncated());
    }
    let (number, number_len) = utf8::decode(&bytes[consumed..])
        .map_err(|_| Error::invalid_frame_header("UTF-8 coded number cannot be read"))?;
    consumed += number_len;

    let block_size = match block_size_code {
        0 => return Err(Error::invalid_frame_header("Block size 0 is reserved")),
        1 => 192,
        2..=5 => 576 << (block_size_code - 2),
        6 => u32::from(take_u8(bytes, &mut consumed)?) + 1,
        7 => u32::from(take_u16(bytes, &mut consumed)?) + 1,
        _ => 256 << (block_size_code - 8),
    };

    let sample_rate = match sample_rate_code {
        0 => stream_info_sample_rate,
        1 => 88_200,
        2 => 176_400,
        3 => 192_000,
        4 => 8_000,
        5 => 16_000,
        6 => 22_050,
        7 => 24_000,
        8 => 32_000,
        9 => 44_100,
        10 => 48_000,
        11 => 96_000,
        12 => u32::from(take_u8(bytes, &mut consumed)?) * 1000,
        13 => u32::from(take_u16(bytes, &mut consumed)?),
        14 => u32::from(take_u16(bytes, &mut consumed)?) * 10,
        _ => return Err(Error::invalid_frame_header("Sample rate 15 is invalid")),
    };

    let embedded = take_u8(bytes, &mut consumed)?;
    if check_crc {
        let calculated = crc8(&bytes[..consumed - 1]);
        if calculated != embedded {
            return Err(Error::invalid_frame_header(format!(
                "CRC8 did not match. Calculated 0x{calculated:X}, Embedded 0x{embedded:X}"
            )));
        }
    }

    let header = FrameHeader {
        blocking_strategy,
        block_size,
        sample_rate,
        channel_assignment,
        bit_depth,
        number,
        crc8: embedded,
        auxiliary_crc: None,
    };
    Ok((header, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM_RATE: u32 = 12345;
    const STREAM_DEPTH: u8 = 31;

    fn parse(bytes: &[u8]) -> Result<(FrameHeader, usize)> {
        FrameHeader::parse(bytes, STREAM_RATE, STREAM_DEPTH)
    }

    #[allow(clippy::too_many_arguments)]
    fn check(
        bytes: &[u8],
        block_size: u32,
        sample_rate: u32,
        channels: ChannelAssignment,
        bit_depth: u8,
        number: u64,
        crc: u8,
    ) {
        let (header, consumed) = parse(bytes).unwrap();
        assert_eq!(consumed, bytes.len(), "consumed for {bytes:02X?}");
        assert_eq!(
            header,
            FrameHeader {
                blocking_strategy: BlockingStrategy::Fixed,
                block_size,
                sample_rate,
                channel_assignment: channels,
                bit_depth,
                number,
                crc8: crc,
                auxiliary_crc: None,
            },
            "parsing {bytes:02X?}"
        );
    }

    #[test]
    fn test_simple_headers() {
        use ChannelAssignment::*;

        check(&[0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBF], 1, 44100, LeftRight, 16, 0, 0xBF);
        check(&[0xFF, 0xF8, 0x69, 0x98, 0x00, 0x0F, 0x99], 16, 44100, RightSide, 16, 0, 0x99);
        check(&[0xFF, 0xF8, 0x68, 0x02, 0x00, 0x17, 0xE9], 24, 32000, Mono, 8, 0, 0xE9);
        check(&[0xFF, 0xF8, 0x78, 0x02, 0x00, 0x9C, 0x40, 0x45], 40001, 32000, Mono, 8, 0, 0x45);
    }

    #[test]
    fn test_stream_info_fallbacks() {
        use ChannelAssignment::*;

        check(&[0xFF, 0xF8, 0xE0, 0x02, 0x00, 0x6E], 16384, STREAM_RATE, Mono, 8, 0, 0x6E);
        check(&[0xFF, 0xF8, 0xEB, 0x00, 0x00, 0xE9], 16384, 96000, Mono, STREAM_DEPTH, 0, 0xE9);
    }

    #[test]
    fn test_extension_fields() {
        check(
            &[0xFF, 0xF8, 0x7E, 0x98, 0x00, 0xA2, 0x81, 0x30, 0x39, 0x64],
            41602,
            123450,
            ChannelAssignment::RightSide,
            16,
            0,
            0x64,
        );
    }

    #[test]
    fn test_frame_numbers() {
        use ChannelAssignment::*;

        check(&[0xFF, 0xF8, 0x30, 0x08, 0x00, 0xC3], 1152, STREAM_RATE, Mono, 16, 0, 0xC3);
        check(
            &[0xFF, 0xF8, 0x30, 0x08, 0xF0, 0xA1, 0xA7, 0x8C, 0xCE],
            1152,
            STREAM_RATE,
            Mono,
            16,
            137676,
            0xCE,
        );
        check(&[0xFF, 0xF8, 0xC9, 0xA8, 0x20, 0x6D], 4096, 44100, MidSide, 16, 32, 0x6D);
    }

    #[test]
    fn test_sync_code_must_start_span() {
        for bytes in [
            &[0xFB, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBF][..],
            &[0x00, 0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBF][..],
            &[0xFF][..],
        ] {
            let err = parse(bytes).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid Frame Header: Sync code not found at start of span"
            );
        }
    }

    #[test]
    fn test_reserved_bit_after_sync() {
        assert!(parse(&[0xFF, 0xFA, 0x69, 0x18, 0x00, 0x00, 0xBF]).is_err());
    }

    #[test]
    fn test_bad_crc() {
        let err = parse(&[0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBE]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Frame Header: CRC8 did not match. Calculated 0xBF, Embedded 0xBE"
        );

        let (header, _) = parse_header(
            &[0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBE],
            STREAM_RATE,
            STREAM_DEPTH,
            false,
        )
        .unwrap();
        assert_eq!(header.crc8, 0xBE);
        assert_eq!(header.auxiliary_crc, None);
    }

    #[test]
    fn test_reserved_codes() {
        let cases: [(&[u8], &str); 5] = [
            (&[0xFF, 0xF8, 0x09, 0x18, 0x00, 0x00], "Block size 0 is reserved"),
            (&[0xFF, 0xF8, 0x6F, 0x18, 0x00, 0x00], "Sample rate 15 is invalid"),
            (&[0xFF, 0xF8, 0x69, 0xB8, 0x00, 0x00], "channel assignment is reserved"),
            (&[0xFF, 0xF8, 0x69, 0x16, 0x00, 0x00], "Bit depth is reserved"),
            (&[0xFF, 0xF8, 0x69, 0x18, 0xFE, 0x00], "UTF-8 coded number cannot be read"),
        ];

        for (bytes, message) in cases {
            let err = parse(bytes).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid Frame Header: {message}"));
        }
    }

    #[test]
    fn test_variable_blocking_number() {
        let mut bytes = vec![0xFF, 0xF9, 0x69, 0x18, 0x00];
        bytes.push(crc8(&bytes));
        let (header, consumed) = parse(&bytes).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(header.blocking_strategy, BlockingStrategy::Variable);
        assert_eq!(header.starting_sample(), Some(0));
        assert_eq!(header.frame_number(), None);
    }

    #[test]
    fn test_truncated() {
        let err = parse(&[0xFF, 0xF8, 0x7E, 0x98, 0x00, 0xA2]).unwrap_err();
        assert!(matches!(err, Error::InvalidFrameHeader(_)));
    }

    #[test]
    fn test_channel_counts() {
        assert_eq!(ChannelAssignment::MidSide.channels(), 2);
        assert_eq!(ChannelAssignment::Surround7_1.channels(), 8);
        assert_eq!(ChannelAssignment::from_code(11), None);
    }
}
