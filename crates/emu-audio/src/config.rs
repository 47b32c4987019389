//! Scanner configuration.

/// Options for [`scan_for_chunks`](crate::riff::scan_for_chunks).
///
/// ```
/// use emu_audio::config::ScanOptions;
///
/// let options = ScanOptions::builder()
///     .allow_out_of_bounds(true)
///     .limit(1)
///     .build();
/// assert_eq!(options.limit, Some(1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanOptions {
    /// Keep scanning past chunks whose declared length overruns the source.
    /// Matches are returned flagged as out of bounds.
    /// Default: false
    pub allow_out_of_bounds: bool,

    /// Stop after this many matches.
    /// Default: None (collect every match)
    pub limit: Option<usize>,
}

impl ScanOptions {
    /// Options for finding the first matching chunk.
    pub fn first() -> Self {
        Self {
            allow_out_of_bounds: false,
            limit: Some(1),
        }
    }

    /// Create a builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }
}

/// Builder for `ScanOptions`.
#[derive(Debug, Clone, Default)]
pub struct ScanOptionsBuilder {
    allow_out_of_bounds: Option<bool>,
    limit: Option<usize>,
}

impl ScanOptionsBuilder {
    /// Tolerate chunks that overrun the source.
    pub fn allow_out_of_bounds(mut self, allow: bool) -> Self {
        self.allow_out_of_bounds = Some(allow);
        self
    }

    /// Stop after `limit` matches.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build the options.
    pub fn build(self) -> ScanOptions {
        ScanOptions {
            allow_out_of_bounds: self.allow_out_of_bounds.unwrap_or(false),
            limit: self.limit,
        }
    }
}

/// Default read buffer for frame enumeration (64 KiB).
pub const DEFAULT_FRAME_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for FLAC frame enumeration.
///
/// Relaxing the checks makes the enumerator accept more sync-like byte
/// patterns inside audio payloads as frames, so counts become less reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameScanConfig {
    /// Bytes read from the source per refill.
    /// Default: 64 KiB
    pub buffer_size: usize,

    /// Reject candidate frames whose header CRC-8 does not match.
    /// Default: true
    pub check_crc: bool,

    /// Reject candidate frames that do not follow on from the previous one.
    /// Default: true
    pub check_consecutive: bool,
}

impl Default for FrameScanConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_FRAME_BUFFER_SIZE,
            check_crc: true,
            check_consecutive: true,
        }
    }
}

impl FrameScanConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> FrameScanConfigBuilder {
        FrameScanConfigBuilder::default()
    }
}

/// Builder for `FrameScanConfig`.
#[derive(Debug, Clone, Default)]
pub struct FrameScanConfigBuilder {
    buffer_size: Option<usize>,
    check_crc: Option<bool>,
    check_consecutive: Option<bool>,
}

impl FrameScanConfigBuilder {
    /// Set the read buffer size. Values below the maximum frame header
    /// size are raised to it.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Enable or disable header CRC-8 validation.
    pub fn check_crc(mut self, check: bool) -> Self {
        self.check_crc = Some(check);
        self
    }

    /// Enable or disable the consecutive frame check.
    pub fn check_consecutive(mut self, check: bool) -> Self {
        self.check_consecutive = Some(check);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> FrameScanConfig {
        let defaults = FrameScanConfig::default();
        FrameScanConfig {
            buffer_size: self
                .buffer_size
                .unwrap_or(defaults.buffer_size)
                .max(crate::flac::frame_header::MAX_HEADER_SIZE),
            check_crc: self.check_crc.unwrap_or(defaults.check_crc),
            check_consecutive: self.check_consecutive.unwrap_or(defaults.check_consecutive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let options = ScanOptions::default();
        assert!(!options.allow_out_of_bounds);
        assert_eq!(options.limit, None);
        assert_eq!(ScanOptions::first().limit, Some(1));
    }

    #[test]
    fn test_frame_config_builder() {
        let config = FrameScanConfig::builder()
            .buffer_size(4)
            .check_crc(false)
            .build();
        assert_eq!(config.buffer_size, crate::flac::frame_header::MAX_HEADER_SIZE);
        assert!(!config.check_crc);
        assert!(config.check_consecutive);
    }

    #[test]
    fn test_frame_config_default() {
        let config = FrameScanConfig::new();
        assert_eq!(config.buffer_size, DEFAULT_FRAME_BUFFER_SIZE);
        assert!(config.check_crc);
    }
}
