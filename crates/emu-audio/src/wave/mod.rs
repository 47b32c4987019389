//! RIFF/WAVE chunk catalog.
//!
//! Locates the chunks of a WAVE file (`fmt `, `data`, `cue `, `LIST`) and
//! interprets their payloads.
//!
//! ```no_run
//! use emu_audio::wave;
//! use std::fs::File;
//!
//! let mut file = File::open("recording.wav")?;
//! let riff = emu_audio::riff::find_riff_chunk(&mut file)?;
//! let wave_range = wave::find_wave_chunk(&mut file, riff)?;
//! let format = wave::read_format(&mut file, wave_range)?;
//! let data = wave::find_data_chunk(&mut file, wave_range, true)?;
//! let samples = wave::get_total_samples(data, format.channels, format.bits_per_sample)?;
//! println!("{} Hz, {} samples", format.sample_rate, samples);
//! # Ok::<(), emu_audio::Error>(())
//! ```

pub mod cue;
pub mod list;

pub use cue::{parse_cue_chunk, Cue, CuePoint};
pub use list::{
    parse_associated_data_list, parse_info_list, parse_list_chunk, AssociatedDataList, CueText,
    InfoList, LabelledText, ListChunk, ListItem,
};

use crate::binary::{u16_le_at, u32_le_at};
use crate::config::ScanOptions;
use crate::range::{read_fully, read_range, seek_to, ByteRange};
use crate::riff::{self, scan_for_chunk, scan_for_chunks, ChunkId, CHUNK_ID_LENGTH};
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Minimum length of a `fmt ` payload.
pub const MIN_FORMAT_LENGTH: usize = 16;

/// Audio format tag of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioFormat {
    Pcm,
    Float,
    Extensible,
    Other(u16),
}

impl From<u16> for AudioFormat {
    fn from(tag: u16) -> Self {
        match tag {
            1 => Self::Pcm,
            3 => Self::Float,
            0xFFFE => Self::Extensible,
            other => Self::Other(other),
        }
    }
}

impl From<AudioFormat> for u16 {
    fn from(format: AudioFormat) -> Self {
        match format {
            AudioFormat::Pcm => 1,
            AudioFormat::Float => 3,
            AudioFormat::Extensible => 0xFFFE,
            AudioFormat::Other(tag) => tag,
        }
    }
}

/// Audio format tag. The slice must hold at least 2 bytes.
pub fn get_audio_format(format: &[u8]) -> AudioFormat {
    AudioFormat::from(u16_le_at(format, 0))
}

/// Channel count. The slice must hold at least 4 bytes.
pub fn get_channels(format: &[u8]) -> u16 {
    u16_le_at(format, 2)
}

/// Sample rate in Hz. The slice must hold at least 8 bytes.
pub fn get_sample_rate(format: &[u8]) -> u32 {
    u32_le_at(format, 4)
}

/// Average bytes per second. The slice must hold at least 12 bytes.
pub fn get_byte_rate(format: &[u8]) -> u32 {
    u32_le_at(format, 8)
}

/// Bytes per sample frame. The slice must hold at least 14 bytes.
pub fn get_block_align(format: &[u8]) -> u16 {
    u16_le_at(format, 12)
}

/// Bits per sample. The slice must hold at least 16 bytes.
pub fn get_bits_per_sample(format: &[u8]) -> u16 {
    u16_le_at(format, 14)
}

/// Fields of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaveFormat {
    pub audio_format: AudioFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormat {
    /// Decode a `fmt ` payload. Extension bytes past the first 16 are ignored.
    pub fn from_bytes(format: &[u8]) -> Result<Self> {
        if format.len() < MIN_FORMAT_LENGTH {
            return Err(Error::file_too_short(format!("a {} chunk", ChunkId::FMT)));
        }

        Ok(Self {
            audio_format: get_audio_format(format),
            channels: get_channels(format),
            sample_rate: get_sample_rate(format),
            byte_rate: get_byte_rate(format),
            block_align: get_block_align(format),
            bits_per_sample: get_bits_per_sample(format),
        })
    }
}

/// Check the RIFF form type is `WAVE`.
///
/// The returned range starts after the form type and ends with the RIFF
/// chunk, keeping its out of bounds flag.
pub fn find_wave_chunk<R: Read + Seek>(source: &mut R, riff: ByteRange) -> Result<ByteRange> {
    if riff.len() < CHUNK_ID_LENGTH as u64 {
        return Err(Error::FileTooShortRiff);
    }

    seek_to(source, riff.start)?;

    let mut form = [0u8; CHUNK_ID_LENGTH];
    if read_fully(source, &mut form)? != CHUNK_ID_LENGTH {
        return Err(Error::FileTooShortRiff);
    }

    if ChunkId(form) != ChunkId::WAVE {
        return Err(Error::NotWave);
    }

    Ok(riff.skip(CHUNK_ID_LENGTH as u64))
}

/// Find the `fmt ` chunk.
pub fn find_format_chunk<R: Read + Seek>(source: &mut R, wave: ByteRange) -> Result<ByteRange> {
    scan_for_chunk(source, wave, ChunkId::FMT, false)
}

/// Find the `data` chunk.
///
/// Recorders that crash mid-write often leave a `data` length that
/// overruns the file; `allow_out_of_bounds` returns such a chunk flagged
/// instead of failing.
pub fn find_data_chunk<R: Read + Seek>(
    source: &mut R,
    wave: ByteRange,
    allow_out_of_bounds: bool,
) -> Result<ByteRange> {
    scan_for_chunk(source, wave, ChunkId::DATA, allow_out_of_bounds)
}

/// Find the `cue ` chunk.
pub fn find_cue_chunk<R: Read + Seek>(source: &mut R, wave: ByteRange) -> Result<ByteRange> {
    scan_for_chunk(source, wave, ChunkId::CUE, false)
}

/// Find the first `LIST` chunk.
pub fn find_list_chunk<R: Read + Seek>(source: &mut R, wave: ByteRange) -> Result<ByteRange> {
    scan_for_chunk(source, wave, ChunkId::LIST, false)
}

/// Find every `LIST` chunk.
pub fn find_list_chunks<R: Read + Seek>(
    source: &mut R,
    wave: ByteRange,
) -> Result<Vec<ByteRange>> {
    scan_for_chunks(source, wave, ChunkId::LIST, ScanOptions::default())
}

/// Read the payload of the first `LIST` chunk whose form type is `sub_type`.
///
/// Fails with [`Error::ChunkNotFound`] naming `sub_type` if no list has that
/// form type.
pub fn read_list_chunk<R: Read + Seek>(
    source: &mut R,
    wave: ByteRange,
    sub_type: ChunkId,
) -> Result<Vec<u8>> {
    let lists = match find_list_chunks(source, wave) {
        Ok(lists) => lists,
        Err(Error::ChunkNotFound(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    for range in lists {
        if range.len() < CHUNK_ID_LENGTH as u64 {
            continue;
        }

        seek_to(source, range.start)?;
        let mut form = [0u8; CHUNK_ID_LENGTH];
        if read_fully(source, &mut form)? != CHUNK_ID_LENGTH {
            continue;
        }

        if ChunkId(form) == sub_type {
            return read_range(source, range);
        }
    }

    Err(Error::ChunkNotFound(sub_type))
}

/// Read and parse the `INFO` list.
pub fn read_info_list<R: Read + Seek>(source: &mut R, wave: ByteRange) -> Result<InfoList> {
    let bytes = read_list_chunk(source, wave, ChunkId::INFO)?;
    Ok(parse_info_list(&bytes))
}

/// Read and parse the `fmt ` chunk.
pub fn read_format<R: Read + Seek>(source: &mut R, wave: ByteRange) -> Result<WaveFormat> {
    let range = find_format_chunk(source, wave)?;
    let bytes = read_range(source, range)?;
    WaveFormat::from_bytes(&bytes)
}

/// Number of samples per channel in a `data` chunk.
///
/// Integer division; a partial trailing sample frame is not counted.
pub fn get_total_samples(data: ByteRange, channels: u16, bits_per_sample: u16) -> Result<u64> {
    let bytes_per_sample = u64::from(bits_per_sample / 8);
    if channels == 0 || bytes_per_sample == 0 {
        return Err(Error::InvalidSampleInformation);
    }

    Ok(data.len() / (u64::from(channels) * bytes_per_sample))
}

/// Find the cue points and join them with the `adtl` list, if present.
pub fn find_and_parse_cue_points<R: Read + Seek>(
    source: &mut R,
    wave: ByteRange,
) -> Result<Vec<Cue>> {
    let cue_range = find_cue_chunk(source, wave)?;
    let cue_bytes = read_range(source, cue_range)?;

    let notes = match read_list_chunk(source, wave, ChunkId::ADTL) {
        Ok(bytes) => parse_associated_data_list(&bytes),
        Err(Error::ChunkNotFound(_)) => AssociatedDataList::default(),
        Err(e) => return Err(e),
    };

    Ok(parse_cue_chunk(&cue_bytes, &notes))
}

/// Check whether the source is a RIFF/WAVE file.
///
/// Format problems yield `false`; I/O failures are returned.
pub fn is_wave_file<R: Read + Seek>(source: &mut R) -> Result<bool> {
    let found = riff::find_riff_chunk(source).and_then(|r| find_wave_chunk(source, r));
    match found {
        Ok(_) => Ok(true),
        Err(Error::Io(e)) => Err(Error::Io(e)),
        Err(_) => Ok(false),
    }
}

/// Check whether the source is a PCM RIFF/WAVE file.
pub fn is_pcm_wave_file<R: Read + Seek>(source: &mut R) -> Result<bool> {
    let riff = riff::find_riff_chunk(source)?;
    let wave = find_wave_chunk(source, riff)?;
    let format = find_format_chunk(source, wave)?;
    let bytes = read_range(source, format)?;
    if bytes.len() < 2 {
        return Err(Error::file_too_short(format!("a {} chunk", ChunkId::FMT)));
    }

    Ok(get_audio_format(&bytes) == AudioFormat::Pcm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn format_payload(channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let align = channels * bits / 8;
        let mut out = Vec::new();
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * u32::from(align)).to_le_bytes());
        out.extend_from_slice(&align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out
    }

    fn wave_file(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut body = b"WAVE".to_vec();
        for (id, payload) in chunks {
            body.extend_from_slice(*id);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
        }
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn test_format_accessors() {
        let fmt = format_payload(2, 22050, 16);
        assert_eq!(get_audio_format(&fmt), AudioFormat::Pcm);
        assert_eq!(get_channels(&fmt), 2);
        assert_eq!(get_sample_rate(&fmt), 22050);
        assert_eq!(get_byte_rate(&fmt), 88200);
        assert_eq!(get_block_align(&fmt), 4);
        assert_eq!(get_bits_per_sample(&fmt), 16);
    }

    #[test]
    fn test_format_too_short() {
        assert!(matches!(
            WaveFormat::from_bytes(&[1, 0, 1, 0]),
            Err(Error::FileTooShort(_))
        ));
    }

    #[test]
    fn test_audio_format_tags() {
        assert_eq!(AudioFormat::from(3), AudioFormat::Float);
        assert_eq!(AudioFormat::from(0xFFFE), AudioFormat::Extensible);
        assert_eq!(u16::from(AudioFormat::Other(85)), 85);
    }

    #[test]
    fn test_total_samples() {
        let data = ByteRange::new(44, 44 + 8000);
        assert_eq!(get_total_samples(data, 1, 16).unwrap(), 4000);
        assert_eq!(get_total_samples(data, 2, 16).unwrap(), 2000);
        assert_eq!(get_total_samples(ByteRange::new(0, 7), 2, 16).unwrap(), 1);
    }

    #[test]
    fn test_total_samples_zero_guard() {
        let data = ByteRange::new(0, 100);
        assert!(matches!(
            get_total_samples(data, 0, 16),
            Err(Error::InvalidSampleInformation)
        ));
        assert!(matches!(
            get_total_samples(data, 1, 0),
            Err(Error::InvalidSampleInformation)
        ));
    }

    #[test]
    fn test_find_wave_chunk() {
        let bytes = wave_file(&[(b"fmt ", format_payload(1, 8000, 16))]);
        let mut cursor = Cursor::new(bytes);

        let riff = riff::find_riff_chunk(&mut cursor).unwrap();
        let wave = find_wave_chunk(&mut cursor, riff).unwrap();
        assert_eq!(wave.start, 12);
        assert_eq!(wave.end, riff.end);

        let format = read_format(&mut cursor, wave).unwrap();
        assert_eq!(format.sample_rate, 8000);
    }

    #[test]
    fn test_find_wave_chunk_rejects_other_forms() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"AVI ");
        let mut cursor = Cursor::new(bytes);

        let riff = riff::find_riff_chunk(&mut cursor).unwrap();
        assert!(matches!(
            find_wave_chunk(&mut cursor, riff),
            Err(Error::NotWave)
        ));
        assert!(!is_wave_file(&mut cursor).unwrap());
    }

    #[test]
    fn test_read_list_chunk_picks_sub_type() {
        let bytes = wave_file(&[
            (b"fmt ", format_payload(1, 8000, 16)),
            (b"LIST", b"INFOIART\x02\0\0\0x\0".to_vec()),
            (b"LIST", b"adtl".to_vec()),
        ]);
        let mut cursor = Cursor::new(bytes);
        let riff = riff::find_riff_chunk(&mut cursor).unwrap();
        let wave = find_wave_chunk(&mut cursor, riff).unwrap();

        assert_eq!(read_list_chunk(&mut cursor, wave, ChunkId::ADTL).unwrap(), b"adtl");
        let info = read_info_list(&mut cursor, wave).unwrap();
        assert_eq!(info.get(ChunkId::IART), Some("x"));

        assert!(matches!(
            read_list_chunk(&mut cursor, wave, ChunkId(*b"wavl")),
            Err(Error::ChunkNotFound(_))
        ));
    }

    #[test]
    fn test_is_pcm_wave_file() {
        let bytes = wave_file(&[(b"fmt ", format_payload(1, 8000, 16))]);
        assert!(is_pcm_wave_file(&mut Cursor::new(bytes)).unwrap());

        let mut float = format_payload(1, 8000, 32);
        float[0] = 3;
        let bytes = wave_file(&[(b"fmt ", float)]);
        assert!(!is_pcm_wave_file(&mut Cursor::new(bytes)).unwrap());
    }
}
