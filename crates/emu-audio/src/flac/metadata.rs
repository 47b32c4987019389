//! FLAC metadata block chain.
//!
//! After the `fLaC` magic come one or more metadata blocks, each with a
//! 4-byte header: a last-block flag bit, a 7-bit block type and a 24-bit
//! big-endian payload length. STREAMINFO is always first; audio frames start
//! right after the block flagged last.

use super::BLOCK_TYPE_OFFSET;
use crate::binary::read_u24_be;
use crate::range::{read_fully, seek_to, ByteRange};
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Length of a metadata block header.
pub const BLOCK_HEADER_LENGTH: usize = 4;

/// Metadata block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetadataBlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// Reserved (7 to 126) or invalid (127) type.
    Other(u8),
}

impl From<u8> for MetadataBlockType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::StreamInfo,
            1 => Self::Padding,
            2 => Self::Application,
            3 => Self::SeekTable,
            4 => Self::VorbisComment,
            5 => Self::CueSheet,
            6 => Self::Picture,
            other => Self::Other(other),
        }
    }
}

/// A metadata block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetadataBlock {
    pub block_type: MetadataBlockType,
    /// This block is the last in the chain.
    pub last: bool,
    /// Offset of the payload, after the header.
    pub offset: u64,
    /// Payload length.
    pub length: u32,
}

impl MetadataBlock {
    /// Byte range of the payload.
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.offset, self.end())
    }

    /// Offset one past the payload.
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }
}

/// Decode a metadata block header.
fn decode_header(header: [u8; BLOCK_HEADER_LENGTH], offset: u64) -> MetadataBlock {
    MetadataBlock {
        block_type: MetadataBlockType::from(header[0] & 0x7F),
        last: header[0] & 0x80 != 0,
        offset,
        length: read_u24_be(&header[1..]),
    }
}

/// Lazy walk over the metadata block chain.
///
/// Yields each block header in order and stops after the block flagged
/// last, or after the first error.
pub struct MetadataBlocks<'a, R> {
    source: &'a mut R,
    offset: u64,
    done: bool,
}

impl<'a, R: Read + Seek> MetadataBlocks<'a, R> {
    /// Start walking from the first block header.
    pub fn new(source: &'a mut R) -> Self {
        Self {
            source,
            offset: BLOCK_TYPE_OFFSET,
            done: false,
        }
    }

    fn read_next(&mut self) -> Result<MetadataBlock> {
        seek_to(self.source, self.offset)?;

        let mut header = [0u8; BLOCK_HEADER_LENGTH];
        if read_fully(self.source, &mut header)? != BLOCK_HEADER_LENGTH {
            return Err(Error::BadMetadataSeek);
        }

        let block = decode_header(header, self.offset + BLOCK_HEADER_LENGTH as u64);
        tracing::trace!(
            block_type = ?block.block_type,
            offset = block.offset,
            length = block.length,
            "metadata block"
        );
        Ok(block)
    }
}

impl<R: Read + Seek> Iterator for MetadataBlocks<'_, R> {
    type Item = Result<MetadataBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.read_next();
        match &result {
            Ok(block) if !block.last => self.offset = block.end(),
            _ => self.done = true,
        }
        Some(result)
    }
}

/// Read every metadata block header, in order, up to the block flagged last.
pub fn scan_metadata_blocks<R: Read + Seek>(source: &mut R) -> Result<Vec<MetadataBlock>> {
    MetadataBlocks::new(source).collect()
}

/// Find the payload of the first metadata block of `block_type`.
///
/// The walk stops at the first match, so damage further down the chain
/// does not affect the result.
pub fn find_metadata_block<R: Read + Seek>(
    source: &mut R,
    block_type: MetadataBlockType,
) -> Result<ByteRange> {
    for block in MetadataBlocks::new(source) {
        let block = block?;
        if block.block_type == block_type {
            return Ok(block.range());
        }
    }

    Err(Error::MetadataBlockNotFound(block_type))
}

/// Offset of the first audio frame: the end of the last metadata block.
pub fn find_frame_start<R: Read + Seek>(source: &mut R) -> Result<u64> {
    let blocks = scan_metadata_blocks(source)?;
    let last = blocks.last().ok_or(Error::BadMetadataSeek)?;
    Ok(last.end())
}
