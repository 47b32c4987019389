//! Synthetic recordings shared by the integration tests.

#![allow(dead_code)]

use emu_audio::flac::{crc::crc8, utf8};
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Route library logs to the test output. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A RIFF sub-chunk with a little-endian length.
pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// A 16-byte PCM `fmt ` payload.
pub fn format_payload(format_tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut out = Vec::new();
    out.extend_from_slice(&format_tag.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out
}

/// Wrap chunks in a RIFF/WAVE header with a correct length.
pub fn wave_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = chunks.concat();
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(&body);
    out
}

/// `cue ` payload from `(id, sample_offset)` pairs.
pub fn cue_payload(points: &[(u32, u32)]) -> Vec<u8> {
    let mut out = (points.len() as u32).to_le_bytes().to_vec();
    for &(id, sample_offset) in points {
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&sample_offset.to_le_bytes());
    }
    out
}

/// Parameters of a synthetic FLAC stream: 44.1 kHz, stereo, 16 bit.
pub const FLAC_SAMPLE_RATE: u32 = 44_100;
pub const FLAC_BLOCK_SIZE: u32 = 4096;

/// A fixed blocking frame: header with a valid CRC, then `payload_len`
/// bytes that never contain a sync code.
pub fn flac_frame(number: u64, block_size: u32, payload_len: usize) -> Vec<u8> {
    let (code, ext) = if block_size == FLAC_BLOCK_SIZE {
        (0b1100u8, Vec::new())
    } else {
        (0b0111u8, ((block_size - 1) as u16).to_be_bytes().to_vec())
    };

    let mut out = vec![0xFF, 0xF8, (code << 4) | 0b1001, 0b0001_1000];
    out.extend(utf8::encode(number).expect("frame number fits"));
    out.extend(ext);
    out.push(crc8(&out));
    out.extend((0..payload_len).map(|i| (i % 200) as u8));
    out
}

/// A FLAC stream with `frames` frames of [`FLAC_BLOCK_SIZE`] samples and a
/// final frame of `last_block` samples.
///
/// STREAMINFO records `recorded_total` samples, and a Vorbis comment block
/// follows it.
pub fn flac_file(frames: u64, last_block: u32, recorded_total: u64) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&(FLAC_BLOCK_SIZE as u16).to_be_bytes());
    info.extend_from_slice(&(FLAC_BLOCK_SIZE as u16).to_be_bytes());
    info.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    // sample rate(20) channels-1(3) bits-1(5) total(36)
    let packed: u64 = (u64::from(FLAC_SAMPLE_RATE) << 44) | (1 << 41) | (15 << 36) | recorded_total;
    info.extend_from_slice(&packed.to_be_bytes());
    info.extend_from_slice(&[0x5D; 16]);
    assert_eq!(info.len(), 34);

    let mut comment = Vec::new();
    let vendor = b"reference libFLAC 1.3.2";
    comment.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    comment.extend_from_slice(vendor);
    comment.extend_from_slice(&1u32.to_le_bytes());
    let tag = b"ARTIST=Frontier Labs";
    comment.extend_from_slice(&(tag.len() as u32).to_le_bytes());
    comment.extend_from_slice(tag);

    let mut out = b"fLaC".to_vec();
    out.push(0x00);
    out.extend_from_slice(&(info.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(&info);
    out.push(0x84);
    out.extend_from_slice(&(comment.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(&comment);

    for number in 0..frames {
        out.extend(flac_frame(number, FLAC_BLOCK_SIZE, 300));
    }
    out.extend(flac_frame(frames, last_block, 120));
    out
}

/// A source that serves `fail_after` bytes and then fails every read, like a
/// card pulled mid-transfer.
pub struct FailingReader {
    inner: Cursor<Vec<u8>>,
    fail_after: u64,
}

impl FailingReader {
    pub fn new(bytes: Vec<u8>, fail_after: u64) -> Self {
        Self {
            inner: Cursor::new(bytes),
            fail_after,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.fail_after.saturating_sub(self.inner.position());
        if remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "device removed"));
        }
        let n = buf.len().min(remaining as usize);
        self.inner.read(&mut buf[..n])
    }
}

impl Seek for FailingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
