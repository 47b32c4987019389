//! `cue ` chunk parsing and cue text association.

use super::list::{AssociatedDataList, CueText};
use crate::binary::u32_le_at;
use crate::riff::ChunkId;

/// Size of one cue point record.
pub const CUE_POINT_LENGTH: usize = 24;

/// A cue point record from a `cue ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CuePoint {
    /// Identifier shared with associated data list entries.
    pub id: u32,
    /// Play order position.
    pub position: u32,
    /// Chunk the cue refers to, normally `data`.
    pub fcc_chunk: ChunkId,
    pub chunk_start: u32,
    pub block_start: u32,
    /// Sample offset of the cue within the referenced chunk.
    pub sample_offset: u32,
}

impl CuePoint {
    /// Decode one record.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`CUE_POINT_LENGTH`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            id: u32_le_at(bytes, 0),
            position: u32_le_at(bytes, 4),
            fcc_chunk: ChunkId::from_slice(&bytes[8..]),
            chunk_start: u32_le_at(bytes, 12),
            block_start: u32_le_at(bytes, 16),
            sample_offset: u32_le_at(bytes, 20),
        }
    }

    /// Sample position of the cue.
    pub fn sample_position(&self) -> u32 {
        self.sample_offset
    }
}

/// A cue point joined with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cue {
    pub sample_position: u32,
    /// Text of the first `labl` entry for this cue.
    pub label: Option<String>,
    /// Text of the first `note` entry for this cue.
    pub note: Option<String>,
    /// Text of the first `ltxt` entry for this cue.
    pub text: Option<String>,
}

/// Decode the cue point records of a `cue ` chunk payload.
///
/// Records past the end of the payload are dropped, so a count larger than
/// the payload can hold yields only the complete records.
pub fn parse_cue_points(bytes: &[u8]) -> Vec<CuePoint> {
    if bytes.len() < 4 {
        return Vec::new();
    }

    let count = u32_le_at(bytes, 0) as usize;
    let records = &bytes[4..];
    let available = records.len() / CUE_POINT_LENGTH;
    if count != available || records.len() % CUE_POINT_LENGTH != 0 {
        tracing::warn!(count, available, "cue count does not match chunk length");
    }

    records
        .chunks_exact(CUE_POINT_LENGTH)
        .take(count)
        .map(CuePoint::from_bytes)
        .collect()
}

/// Join each cue point in a `cue ` payload with its associated text.
///
/// Produces one [`Cue`] per cue point. For each kind of text the first
/// entry with a matching id wins; cues without text get `None`.
pub fn parse_cue_chunk(bytes: &[u8], notes: &AssociatedDataList) -> Vec<Cue> {
    parse_cue_points(bytes)
        .into_iter()
        .map(|point| {
            let mut cue = Cue {
                sample_position: point.sample_position(),
                label: None,
                note: None,
                text: None,
            };

            for entry in notes.for_cue(point.id) {
                let slot = match entry {
                    CueText::Label { .. } => &mut cue.label,
                    CueText::Note { .. } => &mut cue.note,
                    CueText::LabelledText(_) => &mut cue.text,
                };
                if slot.is_none() {
                    *slot = Some(entry.text().to_owned());
                }
            }

            cue
        })
        .collect()
}
