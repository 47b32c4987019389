//! Error types for emu-audio.

use crate::flac::metadata::MetadataBlockType;
use crate::riff::ChunkId;
use std::io;
use thiserror::Error;

/// Result type for emu-audio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for container parsing operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source ended before a fixed-size header could be read.
    #[error("Stream is not long enough to read {0}")]
    FileTooShort(String),

    /// The source is too short to hold a RIFF header.
    #[error("File is not long enough to have a RIFF/WAVE header")]
    FileTooShortRiff,

    /// The source is too short to hold a FLAC stream.
    #[error("File is not long enough to have a FLAC header")]
    FileTooShortFlac,

    /// Magic bytes did not match.
    #[error("Invalid file data")]
    InvalidFileData,

    /// A RIFF container whose form type is not `WAVE`.
    #[error("Cannot process a non-WAVE RIFF file")]
    NotWave,

    /// A seek landed somewhere other than the requested offset.
    #[error("Invalid offset: expected {expected}, got {actual}")]
    InvalidOffset { expected: u64, actual: u64 },

    /// A chunk declares a length that overruns the source.
    #[error("Chunk {0} is invalid, its declared length exceeds the stream")]
    InvalidChunk(ChunkId),

    /// A scan ended without finding the target chunk.
    #[error("Could not find a {0} chunk")]
    ChunkNotFound(ChunkId),

    /// A FLAC metadata block header could not be read in full.
    #[error("Could not seek to the next metadata block")]
    BadMetadataSeek,

    /// The FLAC metadata chain has no block of the requested type.
    #[error("Metadata block {0:?} was not found")]
    MetadataBlockNotFound(MetadataBlockType),

    /// Channel count or bit depth is zero.
    #[error("Invalid sample information: channels and bits per sample must be non-zero")]
    InvalidSampleInformation,

    /// Variable-length integer could not be decoded.
    #[error(transparent)]
    Utf8(#[from] Utf8Error),

    /// Frame header failed validation.
    #[error("Invalid Frame Header: {0}")]
    InvalidFrameHeader(String),

    /// Could not position the source at the first frame.
    #[error("Could not seek to the start of the first frame")]
    BadFrameSeek,

    /// Too few frames to derive a sample count.
    #[error("Could not find enough frames to count samples for")]
    NotEnoughFrames,

    /// Minimum and maximum block sizes differ.
    #[error("Sample counting from the end of the file needs a fixed block size")]
    VariableBlockSize,

    /// A frame list contains both fixed and variable blocking.
    #[error("Found a mix of fixed and variable size frames; this is not allowed")]
    MixedBlockingStrategy,

    /// A frame does not follow on from its predecessor.
    #[error("Found non-consecutive frame")]
    NonConsecutiveFrame,

    /// A background task failed to complete.
    #[error("Task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a file too short error.
    pub fn file_too_short(what: impl Into<String>) -> Self {
        Self::FileTooShort(what.into())
    }

    /// Create an invalid frame header error.
    pub fn invalid_frame_header(msg: impl Into<String>) -> Self {
        Self::InvalidFrameHeader(msg.into())
    }
}

/// Failure decoding a FLAC variable-length integer.
///
/// Every variant records how many bytes were examined before the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Utf8Error {
    /// The leading byte is `1111111x`.
    #[error("Unsupported UTF-8 coding (consumed {consumed} bytes)")]
    Unsupported { consumed: usize },

    /// The input ended before all continuation bytes were available.
    #[error("Not enough bytes to decode UTF-8 coded number (consumed {consumed} bytes)")]
    NotEnoughBytes { consumed: usize },

    /// A continuation byte did not match `10xxxxxx`.
    #[error("Bad UTF-8 encoding (consumed {consumed} bytes)")]
    BadEncoding { consumed: usize },
}

impl Utf8Error {
    /// Number of bytes examined before the failure.
    pub fn consumed(&self) -> usize {
        match self {
            Self::Unsupported { consumed }
            | Self::NotEnoughBytes { consumed }
            | Self::BadEncoding { consumed } => *consumed,
        }
    }
}
