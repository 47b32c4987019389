//! Emu-Audio: metadata parsing for passive acoustic monitor recordings
//!
//! This crate reads, and in a few places repairs, the container metadata of
//! WAVE and FLAC recordings. Field recorders are known to write headers
//! that are truncated, oversized or simply wrong, so the readers report
//! damage precisely instead of giving up on the whole file.
//!
//! # Modules
//!
//! - `range` - Byte ranges into a seekable source
//! - `riff` - Generic RIFF sub-chunk scanner
//! - `wave` - WAVE chunk catalog (`fmt `, `data`, `cue `, `LIST`)
//! - `flac` - STREAMINFO, metadata blocks, frame headers and frame scanning
//! - `binary` - Bit-field helpers shared by both formats
//! - `config` - Scanner options
//!
//! # Recounting samples
//!
//! The STREAMINFO total samples field is the cheap answer. Enumerating every
//! frame and summing block sizes is the expensive, trustworthy one:
//!
//! ```no_run
//! use emu_audio::flac;
//! use std::fs::File;
//!
//! let mut file = File::open("recording.flac")?;
//! if flac::is_flac_file(&mut file)? {
//!     let recorded = flac::read_total_samples(&mut file)?;
//!     let counted = flac::count_samples(&mut file)?;
//!     if recorded != counted {
//!         flac::write_total_samples(&mut file, counted)?;
//!     }
//! }
//! # Ok::<(), emu_audio::Error>(())
//! ```
//!
//! All readers take `&mut R where R: Read + Seek` and move its cursor.
//! Use one handle per concurrent task.

pub mod binary;
pub mod config;
pub mod error;
pub mod flac;
pub mod range;
pub mod riff;
pub mod wave;

pub use config::{FrameScanConfig, ScanOptions};
pub use error::{Error, Result, Utf8Error};
pub use flac::{FlacFrame, FrameHeader, StreamInfo};
pub use range::ByteRange;
pub use riff::ChunkId;
pub use wave::{Cue, WaveFormat};
