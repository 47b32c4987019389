//! Byte ranges within a seekable source.

use crate::{Error, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// Upper bound on the buffer reserved up front by [`read_range`].
const INITIAL_READ_CAPACITY: u64 = 64 * 1024;

/// A half-open interval `[start, end)` of byte offsets from the start of a source.
///
/// Ranges derived from corrupt headers may extend past the end of the source.
/// Such ranges are kept, flagged with `out_of_bounds`, so callers can still
/// inspect the damaged file, but they must never be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteRange {
    /// First byte of the range.
    pub start: u64,
    /// One past the last byte of the range.
    pub end: u64,
    /// The declared extent overruns the source.
    pub out_of_bounds: bool,
}

impl ByteRange {
    /// Create an in-bounds range.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start, "range end {end} precedes start {start}");
        Self {
            start,
            end,
            out_of_bounds: false,
        }
    }

    /// Create a range, marking it out of bounds when `end` exceeds `source_len`.
    pub fn bounded(start: u64, end: u64, source_len: u64) -> Self {
        Self {
            start,
            end,
            out_of_bounds: end > source_len,
        }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if an absolute offset falls inside the range.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end
    }

    /// A sub-range starting `skip` bytes in, ending at the same place.
    pub fn skip(&self, skip: u64) -> Self {
        Self {
            start: (self.start + skip).min(self.end),
            end: self.end,
            out_of_bounds: self.out_of_bounds,
        }
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)?;
        if self.out_of_bounds {
            write!(f, " (out of bounds)")?;
        }
        Ok(())
    }
}

/// Length of a source, leaving its cursor at the start.
pub(crate) fn source_len<R: Seek>(source: &mut R) -> Result<u64> {
    let len = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;
    Ok(len)
}

/// Seek to an absolute offset, checking the source landed where asked.
pub(crate) fn seek_to<R: Seek>(source: &mut R, offset: u64) -> Result<()> {
    let actual = source.seek(SeekFrom::Start(offset))?;
    if actual != offset {
        return Err(Error::InvalidOffset {
            expected: offset,
            actual,
        });
    }
    Ok(())
}

/// Read up to `buf.len()` bytes, returning how many were read before EOF.
pub(crate) fn read_fully<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read every byte of `range` from `source`.
///
/// The buffer grows with the bytes actually read, so a length taken from a
/// corrupt header cannot force a large allocation. A source that ends
/// before `range.end` fails with [`io::ErrorKind::UnexpectedEof`].
///
/// # Panics
///
/// Panics if `range` is out of bounds. Callers must check
/// [`ByteRange::out_of_bounds`] before reading.
pub fn read_range<R: Read + Seek>(source: &mut R, range: ByteRange) -> Result<Vec<u8>> {
    assert!(
        !range.out_of_bounds,
        "attempted to read out of bounds range {range}"
    );

    seek_to(source, range.start)?;
    let mut data = Vec::with_capacity(range.len().min(INITIAL_READ_CAPACITY) as usize);
    source.by_ref().take(range.len()).read_to_end(&mut data)?;
    if (data.len() as u64) < range.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("range {range} ends past the source, read {} bytes", data.len()),
        )
        .into());
    }
    Ok(data)
}
