//! `LIST` chunk payloads: `INFO` tag lists and `adtl` cue text.
//!
//! Both grammars are a form type followed by a flat run of sub-chunks, each
//! a 4-byte tag, a little-endian `u32` length and a payload.

use crate::binary::{ascii_trim_nul, u32_le_at};
use crate::riff::{ChunkId, CHUNK_HEADER_LENGTH, CHUNK_ID_LENGTH};
use bytes::BufMut;

/// Size of the numeric fields that open an `ltxt` payload.
pub const LABELLED_TEXT_FIELDS_LENGTH: usize = 28;

/// One entry of an `INFO` list, e.g. `IART` or `ICMT`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListItem {
    /// Entry tag.
    pub item_type: ChunkId,
    /// Entry text with trailing NULs removed.
    pub text: String,
}

impl ListItem {
    /// Tag as a string.
    pub fn type_name(&self) -> &str {
        self.item_type.as_str()
    }
}

/// Parsed `INFO` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfoList {
    pub entries: Vec<ListItem>,
}

impl InfoList {
    /// First entry tagged `item_type`.
    pub fn get(&self, item_type: ChunkId) -> Option<&str> {
        self.entries
            .iter()
            .find(|item| item.item_type == item_type)
            .map(|item| item.text.as_str())
    }
}

/// `ltxt` sub-chunk: text attached to a span of samples.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelledText {
    pub cue_point_id: u32,
    pub sample_length: u32,
    pub purpose_id: u32,
    pub country: u32,
    pub language: u32,
    pub dialect: u32,
    pub code_page: u32,
    pub text: String,
    /// Bytes stored after the text: the NUL terminator and any padding.
    pub terminator: Vec<u8>,
}

impl LabelledText {
    /// Labelled text with the remaining fields zeroed and a single NUL
    /// terminator.
    pub fn new(
        cue_point_id: u32,
        sample_length: u32,
        purpose_id: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            cue_point_id,
            sample_length,
            purpose_id,
            country: 0,
            language: 0,
            dialect: 0,
            code_page: 0,
            text: text.into(),
            terminator: vec![0],
        }
    }
}

/// A text entry from an associated data list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CueText {
    /// `labl` sub-chunk.
    Label {
        cue_point_id: u32,
        text: String,
        terminator: Vec<u8>,
    },
    /// `note` sub-chunk.
    Note {
        cue_point_id: u32,
        text: String,
        terminator: Vec<u8>,
    },
    /// `ltxt` sub-chunk.
    LabelledText(LabelledText),
}

impl CueText {
    /// A `labl` entry terminated by a single NUL.
    pub fn label(cue_point_id: u32, text: impl Into<String>) -> Self {
        Self::Label {
            cue_point_id,
            text: text.into(),
            terminator: vec![0],
        }
    }

    /// A `note` entry terminated by a single NUL.
    pub fn note(cue_point_id: u32, text: impl Into<String>) -> Self {
        Self::Note {
            cue_point_id,
            text: text.into(),
            terminator: vec![0],
        }
    }

    /// Identifier of the cue point this text belongs to.
    pub fn cue_point_id(&self) -> u32 {
        match self {
            Self::Label { cue_point_id, .. } | Self::Note { cue_point_id, .. } => *cue_point_id,
            Self::LabelledText(ltxt) => ltxt.cue_point_id,
        }
    }

    /// The attached text.
    pub fn text(&self) -> &str {
        match self {
            Self::Label { text, .. } | Self::Note { text, .. } => text,
            Self::LabelledText(ltxt) => &ltxt.text,
        }
    }

    /// Bytes written after the text.
    pub fn terminator(&self) -> &[u8] {
        match self {
            Self::Label { terminator, .. } | Self::Note { terminator, .. } => terminator,
            Self::LabelledText(ltxt) => &ltxt.terminator,
        }
    }

    /// Sub-chunk tag for this entry.
    pub fn chunk_id(&self) -> ChunkId {
        match self {
            Self::Label { .. } => ChunkId::LABL,
            Self::Note { .. } => ChunkId::NOTE,
            Self::LabelledText(_) => ChunkId::LTXT,
        }
    }

    /// Write this entry as a sub-chunk. The text is followed by the stored
    /// terminator bytes, so a parsed entry encodes back to its input.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        let fields = match self {
            Self::LabelledText(_) => LABELLED_TEXT_FIELDS_LENGTH,
            _ => 4,
        };
        let length = fields + self.text().len() + self.terminator().len();

        buf.put_slice(&self.chunk_id().0);
        buf.put_u32_le(length as u32);
        match self {
            Self::Label { cue_point_id, .. } | Self::Note { cue_point_id, .. } => {
                buf.put_u32_le(*cue_point_id);
            }
            Self::LabelledText(ltxt) => {
                for field in [
                    ltxt.cue_point_id,
                    ltxt.sample_length,
                    ltxt.purpose_id,
                    ltxt.country,
                    ltxt.language,
                    ltxt.dialect,
                    ltxt.code_page,
                ] {
                    buf.put_u32_le(field);
                }
            }
        }
        buf.put_slice(self.text().as_bytes());
        buf.put_slice(self.terminator());
    }
}

/// Parsed `adtl` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociatedDataList {
    pub entries: Vec<CueText>,
}

impl AssociatedDataList {
    /// Entries attached to a cue point, in list order.
    pub fn for_cue(&self, cue_point_id: u32) -> impl Iterator<Item = &CueText> {
        self.entries
            .iter()
            .filter(move |entry| entry.cue_point_id() == cue_point_id)
    }

    /// Write the list payload, form type included.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&ChunkId::ADTL.0);
        for entry in &self.entries {
            entry.encode(buf);
        }
    }
}

/// A `LIST` chunk payload, dispatched on its form type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListChunk {
    Info(InfoList),
    AssociatedData(AssociatedDataList),
    /// A form type this crate does not interpret.
    Other(ChunkId),
}

/// Parse a `LIST` payload of any supported form type.
///
/// Returns `None` if the payload is too short to hold a form type.
pub fn parse_list_chunk(bytes: &[u8]) -> Option<ListChunk> {
    if bytes.len() < CHUNK_ID_LENGTH {
        return None;
    }

    let list = match ChunkId::from_slice(bytes) {
        ChunkId::INFO => ListChunk::Info(parse_info_list(bytes)),
        ChunkId::ADTL => ListChunk::AssociatedData(parse_associated_data_list(bytes)),
        other => ListChunk::Other(other),
    };
    Some(list)
}

/// Iterate the `(tag, payload)` sub-chunks after a form type.
///
/// A final sub-chunk whose declared length overruns the buffer is clamped to
/// the bytes available. Sub-chunks are not padded to even lengths.
fn sub_chunks(bytes: &[u8]) -> impl Iterator<Item = (ChunkId, &[u8])> {
    let mut index = CHUNK_ID_LENGTH;
    std::iter::from_fn(move || {
        if index + CHUNK_HEADER_LENGTH > bytes.len() {
            if index < bytes.len() {
                tracing::warn!(
                    trailing = bytes.len() - index,
                    "ignoring truncated list sub-chunk header"
                );
            }
            return None;
        }

        let id = ChunkId::from_slice(&bytes[index..]);
        let length = u32_le_at(bytes, index + CHUNK_ID_LENGTH) as usize;
        let start = index + CHUNK_HEADER_LENGTH;
        let end = start.saturating_add(length).min(bytes.len());
        if end - start < length {
            tracing::warn!(chunk = %id, declared = length, available = end - start, "list sub-chunk truncated");
        }

        index = end;
        Some((id, &bytes[start..end]))
    })
}

/// Parse an `INFO` list payload. Payloads of another form type yield an
/// empty list.
pub fn parse_info_list(bytes: &[u8]) -> InfoList {
    if bytes.len() < CHUNK_ID_LENGTH || ChunkId::from_slice(bytes) != ChunkId::INFO {
        return InfoList::default();
    }

    let entries = sub_chunks(bytes)
        .map(|(item_type, payload)| ListItem {
            item_type,
            text: ascii_trim_nul(payload),
        })
        .collect();

    InfoList { entries }
}

/// Split sub-chunk text at its first NUL, keeping everything from the NUL
/// onwards as the terminator.
fn split_text(bytes: &[u8]) -> (String, Vec<u8>) {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    (ascii_trim_nul(&bytes[..end]), bytes[end..].to_vec())
}

/// Parse an `adtl` list payload. Payloads of another form type yield an
/// empty list, as do unknown or undersized sub-chunks.
pub fn parse_associated_data_list(bytes: &[u8]) -> AssociatedDataList {
    if bytes.len() < CHUNK_ID_LENGTH || ChunkId::from_slice(bytes) != ChunkId::ADTL {
        return AssociatedDataList::default();
    }

    let mut entries = Vec::new();
    for (id, payload) in sub_chunks(bytes) {
        let entry = match id {
            ChunkId::LABL | ChunkId::NOTE if payload.len() >= 4 => {
                let cue_point_id = u32_le_at(payload, 0);
                let (text, terminator) = split_text(&payload[4..]);
                if id == ChunkId::LABL {
                    CueText::Label {
                        cue_point_id,
                        text,
                        terminator,
                    }
                } else {
                    CueText::Note {
                        cue_point_id,
                        text,
                        terminator,
                    }
                }
            }
            ChunkId::LTXT if payload.len() >= LABELLED_TEXT_FIELDS_LENGTH => {
                let field = |n: usize| u32_le_at(payload, n * 4);
                let (text, terminator) = split_text(&payload[LABELLED_TEXT_FIELDS_LENGTH..]);

                CueText::LabelledText(LabelledText {
                    cue_point_id: field(0),
                    sample_length: field(1),
                    purpose_id: field(2),
                    country: field(3),
                    language: field(4),
                    dialect: field(5),
                    code_page: field(6),
                    text,
                    terminator,
                })
            }
            other => {
                tracing::trace!(chunk = %other, "skipping associated data sub-chunk");
                continue;
            }
        };
        entries.push(entry);
    }

    AssociatedDataList { entries }
}
