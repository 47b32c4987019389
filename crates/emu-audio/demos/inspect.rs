//! Print container metadata for WAVE and FLAC recordings.
//!
//! ```text
//! cargo run --example inspect --features serde -- recording.flac --count
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use emu_audio::{flac, riff, wave, Error};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inspect")]
#[command(about = "Show container metadata of acoustic monitor recordings")]
struct Cli {
    /// Recordings to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Recount FLAC samples by scanning every frame
    #[arg(long)]
    count: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "emu_audio=trace".to_string()
        } else {
            "emu_audio=info".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    for path in &cli.files {
        let mut file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        // too short for the FLAC magic; left to the WAVE check
        let is_flac = match flac::is_flac_file(&mut file) {
            Ok(is_flac) => is_flac,
            Err(Error::FileTooShortFlac) => false,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        if is_flac {
            inspect_flac(&mut file, &cli)?;
        } else if wave::is_wave_file(&mut file)
            .with_context(|| format!("Failed to read {}", path.display()))?
        {
            inspect_wave(&mut file, &cli)?;
        } else {
            bail!("{} is neither WAVE nor FLAC", path.display());
        }
    }

    Ok(())
}

fn inspect_flac(file: &mut File, cli: &Cli) -> Result<()> {
    let info = flac::read_stream_info(file)?;
    let blocks = flac::scan_metadata_blocks(file)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("FLAC {} Hz, {} ch, {} bit", info.sample_rate, info.channels, info.bit_depth);
        println!("  recorded samples: {}", info.total_samples);
        for block in &blocks {
            println!("  {:?} at {} ({} bytes)", block.block_type, block.offset, block.length);
        }
        match flac::read_vorbis_comment(file) {
            Ok(comment) => {
                println!("  vendor: {}", comment.vendor);
                for (key, value) in &comment.comments {
                    println!("  {key}={value}");
                }
            }
            Err(Error::MetadataBlockNotFound(_)) => {}
            Err(e) => return Err(e).context("Failed to read Vorbis comment"),
        }
    }

    if cli.count {
        let counted = flac::count_samples(file)?;
        let status = if counted == info.total_samples { "ok" } else { "MISMATCH" };
        println!("  counted samples: {counted} ({status})");
    }

    Ok(())
}

fn inspect_wave(file: &mut File, cli: &Cli) -> Result<()> {
    let riff = riff::find_riff_chunk(file)?;
    let wave_range = wave::find_wave_chunk(file, riff)?;
    let format = wave::read_format(file, wave_range)?;
    let data = wave::find_data_chunk(file, wave_range, true)?;
    let samples = wave::get_total_samples(data, format.channels, format.bits_per_sample)?;
    let cues = match wave::find_and_parse_cue_points(file, wave_range) {
        Ok(cues) => cues,
        Err(Error::ChunkNotFound(_)) => Vec::new(),
        Err(e) => return Err(e).context("Failed to read cue points"),
    };

    if cli.json {
        let out = serde_json::json!({
            "format": format,
            "data": data,
            "samples": samples,
            "cues": cues,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "WAVE {:?} {} Hz, {} ch, {} bit",
        format.audio_format, format.sample_rate, format.channels, format.bits_per_sample
    );
    println!("  data: {data}");
    println!("  samples: {samples}");
    for cue in &cues {
        println!(
            "  cue at {}: {}",
            cue.sample_position,
            cue.label.as_deref().or(cue.note.as_deref()).unwrap_or("")
        );
    }

    Ok(())
}
