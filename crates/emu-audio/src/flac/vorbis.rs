//! Vorbis comment metadata block.
//!
//! Unlike the rest of FLAC, lengths in this block are little-endian:
//! a vendor string, a comment count, then `KEY=value` comments.

use super::metadata::{find_metadata_block, MetadataBlockType};
use crate::range::read_range;
use crate::{Error, Result};
use bytes::Buf;
use std::io::{Read, Seek};

/// A parsed Vorbis comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VorbisComment {
    /// Encoder vendor string.
    pub vendor: String,
    /// Comments in block order.
    pub comments: Vec<(String, String)>,
}

impl VorbisComment {
    /// Parse a Vorbis comment payload.
    pub fn parse(mut bytes: &[u8]) -> Result<Self> {
        let vendor = take_string(&mut bytes, "vendor string")?;

        if bytes.remaining() < 4 {
            return Err(Error::file_too_short("the comment count"));
        }
        let count = bytes.get_u32_le();

        let mut comments = Vec::new();
        for _ in 0..count {
            let comment = take_string(&mut bytes, "a comment")?;
            match comment.split_once('=') {
                Some((key, value)) => comments.push((key.to_owned(), value.to_owned())),
                None => tracing::warn!(%comment, "ignoring comment without a key"),
            }
        }

        Ok(Self { vendor, comments })
    }

    /// First value for `key`. Keys compare case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.comments
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

fn take_string(bytes: &mut &[u8], what: &str) -> Result<String> {
    if bytes.remaining() < 4 {
        return Err(Error::file_too_short(format!("the length of {what}")));
    }
    let length = bytes.get_u32_le() as usize;
    if bytes.remaining() < length {
        return Err(Error::file_too_short(what.to_owned()));
    }

    let text = String::from_utf8_lossy(&bytes[..length]).into_owned();
    bytes.advance(length);
    Ok(text)
}

/// Find and parse the Vorbis comment block.
pub fn read_vorbis_comment<R: Read + Seek>(source: &mut R) -> Result<VorbisComment> {
    let range = find_metadata_block(source, MetadataBlockType::VorbisComment)?;
    let bytes = read_range(source, range)?;
    VorbisComment::parse(&bytes)
}
