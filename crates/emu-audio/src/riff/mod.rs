//! Generic RIFF chunk scanning.
//!
//! A RIFF container is a sequence of sibling chunks, each an 8-byte header
//! (4-byte tag, little-endian `u32` length) followed by its payload. The
//! scanner walks siblings by their declared lengths. Chunks are not padded
//! to even lengths: the next sibling is assumed to start immediately after
//! the declared payload.

use crate::config::ScanOptions;
use crate::range::{read_fully, seek_to, source_len, ByteRange};
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Length of a chunk identifier.
pub const CHUNK_ID_LENGTH: usize = 4;

/// Length of a chunk header (identifier plus length).
pub const CHUNK_HEADER_LENGTH: usize = 8;

/// Offset of the RIFF length field.
pub const RIFF_LENGTH_OFFSET: u64 = 4;

/// Smallest possible RIFF header.
pub const MINIMUM_RIFF_HEADER_LENGTH: u64 = 8;

/// Four-character chunk identifier.
///
/// Compared byte for byte, so trailing spaces matter (`b"fmt "`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const RIFF: Self = Self(*b"RIFF");
    pub const WAVE: Self = Self(*b"WAVE");
    pub const FMT: Self = Self(*b"fmt ");
    pub const DATA: Self = Self(*b"data");
    pub const CUE: Self = Self(*b"cue ");
    pub const LIST: Self = Self(*b"LIST");
    pub const INFO: Self = Self(*b"INFO");
    pub const ADTL: Self = Self(*b"adtl");
    pub const LABL: Self = Self(*b"labl");
    pub const NOTE: Self = Self(*b"note");
    pub const LTXT: Self = Self(*b"ltxt");
    pub const IART: Self = Self(*b"IART");
    pub const ICMT: Self = Self(*b"ICMT");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Create from the first four bytes of a slice.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than four bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Get the identifier as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<[u8; 4]> for ChunkId {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// Locate the top-level RIFF chunk.
///
/// The returned range starts after the 8-byte RIFF header and spans the
/// declared length. A declared length that overruns the source is returned
/// flagged as out of bounds rather than rejected.
pub fn find_riff_chunk<R: Read + Seek>(source: &mut R) -> Result<ByteRange> {
    let len = source_len(source)?;
    if len < MINIMUM_RIFF_HEADER_LENGTH {
        return Err(Error::FileTooShortRiff);
    }

    let mut header = [0u8; CHUNK_HEADER_LENGTH];
    if read_fully(source, &mut header)? != CHUNK_HEADER_LENGTH {
        return Err(Error::FileTooShortRiff);
    }

    if ChunkId::from_slice(&header) != ChunkId::RIFF {
        return Err(Error::InvalidFileData);
    }

    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;
    let start = MINIMUM_RIFF_HEADER_LENGTH;
    let range = ByteRange::bounded(start, start + length, len);
    if range.out_of_bounds {
        tracing::debug!(
            declared = length,
            source_len = len,
            "RIFF chunk overruns source"
        );
    }

    Ok(range)
}

/// Scan sibling chunks in `container` for chunks tagged `target`.
///
/// Matches are returned in file order, up to `options.limit`. Fails with
/// [`Error::ChunkNotFound`] when nothing matched, or when a header cannot be
/// read in full before a match is found.
pub fn scan_for_chunks<R: Read + Seek>(
    source: &mut R,
    container: ByteRange,
    target: ChunkId,
    options: ScanOptions,
) -> Result<Vec<ByteRange>> {
    let len = source_len(source)?;

    if len < CHUNK_HEADER_LENGTH as u64 + container.start {
        return Err(Error::file_too_short(format!("a {target} header")));
    }

    let mut found = Vec::new();
    let mut offset = container.start;
    let mut header = [0u8; CHUNK_HEADER_LENGTH];

    while offset < container.end {
        seek_to(source, offset)?;

        let read = read_fully(source, &mut header)?;
        if read != CHUNK_HEADER_LENGTH {
            if found.is_empty() {
                return Err(Error::ChunkNotFound(target));
            }
            break;
        }

        let id = ChunkId::from_slice(&header);
        let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;
        offset += CHUNK_HEADER_LENGTH as u64;

        let range = ByteRange::bounded(offset, offset + length, len);
        if range.out_of_bounds {
            if !options.allow_out_of_bounds {
                return Err(Error::InvalidChunk(id));
            }
            tracing::debug!(chunk = %id, %range, "tolerating out of bounds chunk");
        }

        if id == target {
            tracing::trace!(chunk = %id, %range, "found chunk");
            found.push(range);
            if options.limit.is_some_and(|limit| found.len() >= limit) {
                break;
            }
        }

        offset += length;
    }

    if found.is_empty() {
        return Err(Error::ChunkNotFound(target));
    }

    Ok(found)
}

/// Find the first chunk tagged `target` in `container`.
pub fn scan_for_chunk<R: Read + Seek>(
    source: &mut R,
    container: ByteRange,
    target: ChunkId,
    allow_out_of_bounds: bool,
) -> Result<ByteRange> {
    let options = ScanOptions {
        allow_out_of_bounds,
        ..ScanOptions::first()
    };

    let mut found = scan_for_chunks(source, container, target, options)?;
    Ok(found.swap_remove(0))
}
