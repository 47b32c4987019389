//! FLAC stream parsing.
//!
//! Reads the STREAMINFO block at its fixed position, walks the metadata
//! block chain, and decodes audio frame headers.
//!
//! STREAMINFO layout (offsets from the start of the stream):
//!
//! | offset | bits | field |
//! |---|---|---|
//! | 8 | 16 + 16 | min/max block size |
//! | 12 | 24 + 24 | min/max frame size |
//! | 18 | 20 | sample rate |
//! | 20 | 3 | channels - 1 |
//! | 20 | 5 | bit depth - 1 |
//! | 21 | 36 | total samples |
//! | 26 | 128 | MD5 of the decoded audio |

pub mod crc;
pub mod frame_header;
pub mod frames;
pub mod metadata;
pub mod utf8;
pub mod vorbis;

pub use frame_header::{BlockingStrategy, ChannelAssignment, FrameHeader};
pub use frames::{
    count_samples, count_samples_async, enumerate_frames, enumerate_frames_with_config,
    estimate_total_samples, find_frames, find_frames_async, sample_count_from_frames, FlacFrame,
    FrameIter,
};
pub use metadata::{
    find_frame_start, find_metadata_block, scan_metadata_blocks, MetadataBlock, MetadataBlockType,
};
pub use vorbis::{read_vorbis_comment, VorbisComment};

use crate::binary::{
    read_bits, read_u24_be, read_u36_ignoring_first_nibble, write_u36_preserving_first_nibble,
    U36_MAX,
};
use crate::range::{read_fully, seek_to, source_len};
use crate::{Error, Result};
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::{Cursor, Read, Seek, Write};

/// The `fLaC` stream marker.
pub const MAGIC: [u8; 4] = *b"fLaC";

/// Offset of the first metadata block header.
pub const BLOCK_TYPE_OFFSET: u64 = 4;

/// Offset of the STREAMINFO payload.
pub const STREAM_INFO_OFFSET: u64 = 8;

/// Length of the STREAMINFO payload.
pub const STREAM_INFO_LENGTH: usize = 34;

/// Offset of the minimum and maximum block sizes.
pub const BLOCK_SIZE_OFFSET: u64 = 8;

/// Offset of the minimum and maximum frame sizes.
pub const FRAME_SIZE_OFFSET: u64 = 12;

/// Offset of the sample rate.
pub const SAMPLE_RATE_OFFSET: u64 = 18;

/// Offset of the byte holding the channel count.
pub const CHANNEL_OFFSET: u64 = 20;

/// Offset of the total samples field.
pub const TOTAL_SAMPLES_OFFSET: u64 = 21;

/// Offset of the MD5 signature.
pub const MD5_OFFSET: u64 = 26;

/// Smallest stream that can hold the magic and a STREAMINFO block.
pub const MINIMUM_FILE_LENGTH: u64 = 42;

/// Decoded STREAMINFO block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamInfo {
    pub min_block_size: u16,
    pub max_block_size: u16,
    /// Smallest frame in bytes; 0 if unknown.
    pub min_frame_size: u32,
    /// Largest frame in bytes; 0 if unknown.
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub bit_depth: u8,
    /// Samples per channel; 0 if unknown.
    pub total_samples: u64,
    pub md5: [u8; 16],
}

impl StreamInfo {
    /// Decode a STREAMINFO payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < STREAM_INFO_LENGTH {
            return Err(Error::file_too_short("STREAMINFO"));
        }

        let mut reader = BitReader::endian(Cursor::new(bytes), BigEndian);
        let min_block_size = reader.read::<u16>(16)?;
        let max_block_size = reader.read::<u16>(16)?;
        let min_frame_size = reader.read::<u32>(24)?;
        let max_frame_size = reader.read::<u32>(24)?;
        let sample_rate = reader.read::<u32>(20)?;
        let channels = reader.read::<u8>(3)? + 1;
        let bit_depth = reader.read::<u8>(5)? + 1;
        let total_samples = reader.read::<u64>(36)?;
        let mut md5 = [0u8; 16];
        reader.read_bytes(&mut md5)?;

        Ok(Self {
            min_block_size,
            max_block_size,
            min_frame_size,
            max_frame_size,
            sample_rate,
            channels,
            bit_depth,
            total_samples,
            md5,
        })
    }
}

/// Read exactly `buf.len()` bytes at `offset`.
fn read_exact_at<R: Read + Seek>(source: &mut R, offset: u64, buf: &mut [u8]) -> Result<()> {
    seek_to(source, offset)?;
    if read_fully(source, buf)? != buf.len() {
        return Err(Error::file_too_short("metadata"));
    }
    Ok(())
}

/// Check whether the source is a FLAC stream.
///
/// Requires the `fLaC` magic, a STREAMINFO first block, and enough bytes to
/// hold it. Fails with [`Error::FileTooShortFlac`] when even the magic
/// cannot be read.
pub fn is_flac_file<R: Read + Seek>(source: &mut R) -> Result<bool> {
    let len = source_len(source)?;

    let mut magic = [0u8; 4];
    if read_fully(source, &mut magic)? != magic.len() {
        return Err(Error::FileTooShortFlac);
    }
    if magic != MAGIC {
        return Ok(false);
    }

    let mut block_type = [0u8; 1];
    if read_fully(source, &mut block_type)? != 1 {
        return Err(Error::FileTooShortFlac);
    }

    Ok(len > MINIMUM_FILE_LENGTH && block_type[0] & 0x7F == 0)
}

/// Read the whole STREAMINFO block.
pub fn read_stream_info<R: Read + Seek>(source: &mut R) -> Result<StreamInfo> {
    let mut buf = [0u8; STREAM_INFO_LENGTH];
    read_exact_at(source, STREAM_INFO_OFFSET, &mut buf)?;
    StreamInfo::from_bytes(&buf)
}

/// Minimum and maximum block sizes, in samples.
pub fn read_block_sizes<R: Read + Seek>(source: &mut R) -> Result<(u16, u16)> {
    let mut buf = [0u8; 4];
    read_exact_at(source, BLOCK_SIZE_OFFSET, &mut buf)?;
    Ok((
        u16::from_be_bytes([buf[0], buf[1]]),
        u16::from_be_bytes([buf[2], buf[3]]),
    ))
}

/// Minimum and maximum frame sizes, in bytes.
pub fn read_frame_sizes<R: Read + Seek>(source: &mut R) -> Result<(u32, u32)> {
    let mut buf = [0u8; 6];
    read_exact_at(source, FRAME_SIZE_OFFSET, &mut buf)?;
    Ok((read_u24_be(&buf[..3]), read_u24_be(&buf[3..])))
}

/// Sample rate in Hz.
pub fn read_sample_rate<R: Read + Seek>(source: &mut R) -> Result<u32> {
    let mut buf = [0u8; 3];
    read_exact_at(source, SAMPLE_RATE_OFFSET, &mut buf)?;
    Ok(read_bits(&buf, 0, 20) as u32)
}

/// Number of channels.
pub fn read_channels<R: Read + Seek>(source: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact_at(source, CHANNEL_OFFSET, &mut buf)?;
    Ok(read_bits(&buf, 4, 3) as u8 + 1)
}

/// Bits per sample.
pub fn read_bit_depth<R: Read + Seek>(source: &mut R) -> Result<u8> {
    let mut buf = [0u8; 2];
    read_exact_at(source, CHANNEL_OFFSET, &mut buf)?;
    Ok(read_bits(&buf, 7, 5) as u8 + 1)
}

/// Total samples per channel as recorded in STREAMINFO.
pub fn read_total_samples<R: Read + Seek>(source: &mut R) -> Result<u64> {
    let mut buf = [0u8; 5];
    read_exact_at(source, TOTAL_SAMPLES_OFFSET, &mut buf)?;
    Ok(read_u36_ignoring_first_nibble(&buf))
}

/// MD5 signature of the unencoded audio.
pub fn read_md5<R: Read + Seek>(source: &mut R) -> Result<[u8; 16]> {
    let mut buf = [0u8; 16];
    read_exact_at(source, MD5_OFFSET, &mut buf)?;
    Ok(buf)
}

/// Overwrite the STREAMINFO total samples field in place.
///
/// The bit depth bits sharing the first byte are preserved.
///
/// # Panics
///
/// Panics if `total_samples` does not fit in 36 bits.
pub fn write_total_samples<S: Read + Write + Seek>(source: &mut S, total_samples: u64) -> Result<()> {
    assert!(
        total_samples <= U36_MAX,
        "total samples {total_samples} does not fit in 36 bits"
    );

    let mut buf = [0u8; 5];
    read_exact_at(source, TOTAL_SAMPLES_OFFSET, &mut buf)?;
    write_u36_preserving_first_nibble(&mut buf, total_samples);

    seek_to(source, TOTAL_SAMPLES_OFFSET)?;
    source.write_all(&buf)?;
    source.flush()?;

    tracing::debug!(total_samples, "rewrote STREAMINFO total samples");
    Ok(())
}
