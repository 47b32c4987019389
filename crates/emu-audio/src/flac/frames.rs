//! FLAC audio frame enumeration.
//!
//! Frames carry no length field, so the enumerator finds them by scanning
//! for sync codes. A candidate is accepted only when its header parses, its
//! CRC-8 matches and it follows on from the previous accepted frame. After
//! an accepted header the scan resumes directly behind it, inside the
//! frame payload, until the next sync code is found.

use super::frame_header::{parse_header, BlockingStrategy, FrameHeader, MAX_HEADER_SIZE, SYNC_BYTE_ONE};
use super::metadata::find_frame_start;
use super::{read_stream_info, StreamInfo};
use crate::config::FrameScanConfig;
use crate::range::{read_fully, source_len};
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Fallback for an unknown maximum frame size when scanning the tail.
const UNKNOWN_FRAME_SIZE_GUESS: u64 = 32_768 * 2;

/// How many maximum-size frames from the end the tail estimate scans.
const TAIL_FRAMES: u64 = 3;

/// An audio frame found in a FLAC stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlacFrame {
    /// Position in the enumeration, starting at 0.
    pub index: usize,
    /// Offset of the first sync byte.
    pub offset: u64,
    pub header: FrameHeader,
}

/// Lazy, forward-only iterator over the frames of a FLAC stream.
///
/// Created by [`enumerate_frames`] or [`FrameIter::new`]. Yields an error
/// and stops if the source fails to read.
pub struct FrameIter<R> {
    source: R,
    config: FrameScanConfig,
    sample_rate: u32,
    bit_depth: u8,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    /// Stream offset of `buf[0]`.
    buf_offset: u64,
    eof: bool,
    done: bool,
    index: usize,
    last: Option<FrameHeader>,
}

impl<R: Read + Seek> FrameIter<R> {
    /// Start scanning for frames at `offset`.
    ///
    /// `sample_rate` and `bit_depth` come from STREAMINFO and fill in header
    /// fields that defer to it.
    pub fn new(
        mut source: R,
        offset: u64,
        sample_rate: u32,
        bit_depth: u8,
        config: FrameScanConfig,
    ) -> Result<Self> {
        if source.seek(SeekFrom::Start(offset))? != offset {
            return Err(Error::BadFrameSeek);
        }

        let buffer_size = config.buffer_size.max(MAX_HEADER_SIZE);
        Ok(Self {
            source,
            config,
            sample_rate,
            bit_depth,
            buf: vec![0u8; buffer_size],
            pos: 0,
            filled: 0,
            buf_offset: offset,
            eof: false,
            done: false,
            index: 0,
            last: None,
        })
    }
}

impl<R: Read> FrameIter<R> {
    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn available(&self) -> usize {
        self.filled - self.pos
    }

    /// Move the unscanned tail to the front of the buffer and top it up.
    fn refill(&mut self) -> Result<()> {
        self.buf.copy_within(self.pos..self.filled, 0);
        self.buf_offset += self.pos as u64;
        self.filled -= self.pos;
        self.pos = 0;

        let wanted = self.buf.len() - self.filled;
        let read = read_fully(&mut self.source, &mut self.buf[self.filled..])?;
        self.filled += read;
        if read < wanted {
            self.eof = true;
        }
        Ok(())
    }

    fn check_consecutive(&self, header: &FrameHeader) -> Result<()> {
        let Some(last) = self.last else {
            return Ok(());
        };

        if last.blocking_strategy != header.blocking_strategy {
            return Err(Error::MixedBlockingStrategy);
        }

        let consecutive = match header.blocking_strategy {
            BlockingStrategy::Fixed => last.number + 1 == header.number,
            BlockingStrategy::Variable => last.number <= header.number,
        };
        if !consecutive {
            return Err(Error::NonConsecutiveFrame);
        }
        Ok(())
    }

    /// Try to accept a frame at the current position.
    fn candidate(&self) -> Result<(FrameHeader, usize)> {
        let end = (self.pos + MAX_HEADER_SIZE).min(self.filled);
        let (header, size) = parse_header(
            &self.buf[self.pos..end],
            self.sample_rate,
            self.bit_depth,
            self.config.check_crc,
        )?;
        if self.config.check_consecutive {
            self.check_consecutive(&header)?;
        }
        Ok((header, size))
    }

    fn scan(&mut self) -> Result<Option<FlacFrame>> {
        loop {
            if self.available() < MAX_HEADER_SIZE && !self.eof {
                self.refill()?;
                continue;
            }

            let window = &self.buf[self.pos..self.filled];
            let Some(found) = window.iter().position(|&b| b == SYNC_BYTE_ONE) else {
                self.pos = self.filled;
                if self.eof {
                    return Ok(None);
                }
                continue;
            };
            self.pos += found;

            // keep a whole header in view unless the stream has ended
            if self.available() < MAX_HEADER_SIZE && !self.eof {
                continue;
            }
            if self.available() < 2 {
                self.pos = self.filled;
                return Ok(None);
            }

            let second = self.buf[self.pos + 1];
            if second & 0xFE == 0xF8 {
                let offset = self.buf_offset + self.pos as u64;
                match self.candidate() {
                    Ok((header, size)) => {
                        self.pos += size;
                        let frame = FlacFrame {
                            index: self.index,
                            offset,
                            header,
                        };
                        self.index += 1;
                        self.last = Some(header);
                        return Ok(Some(frame));
                    }
                    Err(e) => {
                        tracing::trace!(offset, index = self.index, error = %e, "frame discarded");
                        self.pos += 2;
                    }
                }
            } else if second == SYNC_BYTE_ONE {
                self.pos += 1;
            } else {
                self.pos += 2;
            }
        }
    }
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<FlacFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.scan() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Enumerate frames from the first audio frame, with the default checks.
pub fn enumerate_frames<R: Read + Seek>(
    source: &mut R,
    sample_rate: u32,
    bit_depth: u8,
) -> Result<FrameIter<&mut R>> {
    enumerate_frames_with_config(source, sample_rate, bit_depth, FrameScanConfig::default())
}

/// Enumerate frames from the first audio frame.
pub fn enumerate_frames_with_config<R: Read + Seek>(
    source: &mut R,
    sample_rate: u32,
    bit_depth: u8,
    config: FrameScanConfig,
) -> Result<FrameIter<&mut R>> {
    let start = find_frame_start(source)?;
    tracing::debug!(start, "enumerating frames");
    FrameIter::new(source, start, sample_rate, bit_depth, config)
}

/// Read STREAMINFO and collect every frame in the stream.
pub fn find_frames<R: Read + Seek>(source: &mut R, config: FrameScanConfig) -> Result<Vec<FlacFrame>> {
    let info = read_stream_info(source)?;
    enumerate_frames_with_config(source, info.sample_rate, info.bit_depth, config)?.collect()
}

/// Count samples per channel by summing the block size of every frame.
///
/// Reads the whole stream. Unlike the STREAMINFO total this does not trust
/// anything the encoder wrote ahead of the audio.
pub fn count_samples<R: Read + Seek>(source: &mut R) -> Result<u64> {
    let info = read_stream_info(source)?;

    let mut total = 0u64;
    let mut frames = 0usize;
    for frame in enumerate_frames(source, info.sample_rate, info.bit_depth)? {
        total += u64::from(frame?.header.block_size);
        frames += 1;
    }

    tracing::debug!(frames, total, recorded = info.total_samples, "counted samples");
    Ok(total)
}

/// Total samples per channel for a list of frames from one stream.
pub fn sample_count_from_frames(frames: &[FlacFrame]) -> Result<u64> {
    let first = frames.first().ok_or(Error::NotEnoughFrames)?;
    if frames
        .iter()
        .any(|f| f.header.blocking_strategy != first.header.blocking_strategy)
    {
        return Err(Error::MixedBlockingStrategy);
    }

    Ok(frames.iter().map(|f| u64::from(f.header.block_size)).sum())
}

/// Estimate total samples from the last two frames only.
///
/// Scans roughly three maximum-size frames back from the end. Only works for
/// fixed blocking streams: the penultimate frame number times the block size
/// covers every earlier frame, and the last frame adds its own block.
pub fn estimate_total_samples<R: Read + Seek>(source: &mut R) -> Result<u64> {
    let info = read_stream_info(source)?;
    if info.min_block_size != info.max_block_size {
        return Err(Error::VariableBlockSize);
    }

    let largest = match u64::from(info.max_frame_size) {
        0 => UNKNOWN_FRAME_SIZE_GUESS,
        n => n,
    };
    let len = source_len(source)?;
    let start = find_frame_start(source)?;
    let offset = len.saturating_sub(largest * TAIL_FRAMES).max(start);
    tracing::debug!(offset, len, "scanning tail for last frames");

    let frames = FrameIter::new(
        &mut *source,
        offset,
        info.sample_rate,
        info.bit_depth,
        FrameScanConfig::default(),
    )?
    .collect::<Result<Vec<_>>>()?;

    tail_sample_count(&info, &frames)
}

fn tail_sample_count(info: &StreamInfo, frames: &[FlacFrame]) -> Result<u64> {
    let [.., penultimate, last] = frames else {
        return Err(Error::NotEnoughFrames);
    };
    let number = penultimate
        .header
        .frame_number()
        .ok_or(Error::VariableBlockSize)?;

    let total = (number + 1) * u64::from(penultimate.header.block_size) + u64::from(last.header.block_size);
    tracing::debug!(total, recorded = info.total_samples, "estimated samples from tail");
    Ok(total)
}

async fn run_blocking<R, T, F>(source: R, scan: F) -> Result<(R, T)>
where
    R: Read + Seek + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut R) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<(R, T)> {
        let mut source = source;
        let value = scan(&mut source)?;
        Ok((source, value))
    })
    .await
    .map_err(|e| Error::Task(e.to_string()))?
}

/// [`count_samples`] on a blocking thread.
///
/// Takes ownership of the source and hands it back with the count.
pub async fn count_samples_async<R>(source: R) -> Result<(R, u64)>
where
    R: Read + Seek + Send + 'static,
{
    run_blocking(source, count_samples).await
}

/// [`find_frames`] on a blocking thread.
pub async fn find_frames_async<R>(source: R, config: FrameScanConfig) -> Result<(R, Vec<FlacFrame>)>
where
    R: Read + Seek + Send + 'static,
{
    run_blocking(source, move |s| find_frames(s, config)).await
}
