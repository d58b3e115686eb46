//! amimus: converts Amiga tracker modules to Standard MIDI Files.
//!
//! Usage:
//!   amimus song.sa song.mid
//!   amimus hipc.title title.mid --samples smp.title
//!   amimus song.sa lead.mid --merge --solo 0

use std::fs;
use std::path::PathBuf;

use am_master::{Converter, ExportOptions, InstrumentMap, InstrumentTracking, Module, SmfLayout};
use anyhow::{Context, Result};
use clap::Parser;

/// Convert a Sonic Arranger or Hippel COSO module to MIDI
#[derive(Debug, Parser)]
#[command(name = "amimus", version)]
struct Cli {
    /// Module to convert
    input: PathBuf,
    /// MIDI file to write
    output: PathBuf,
    /// Separate sample data file
    #[arg(long)]
    samples: Option<PathBuf>,
    /// Instrument map (name=program lines)
    #[arg(long, default_value = "amimus.ini")]
    config: PathBuf,
    /// Song index to export
    #[arg(long, default_value_t = 0)]
    song: usize,
    /// Write a single merged track (format 0) so mute and solo apply
    #[arg(long)]
    merge: bool,
    /// Mute an output track (0-3); repeatable
    #[arg(long, value_name = "TRACK")]
    mute: Vec<usize>,
    /// Solo an output track (0-3); repeatable
    #[arg(long, value_name = "TRACK")]
    solo: Vec<usize>,
    /// Track the shared-channel instrument across all tracks instead of per track
    #[arg(long)]
    shared_instrument_state: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let instruments = InstrumentMap::load(&cli.config)
        .with_context(|| format!("Failed to read instrument map {}", cli.config.display()))?;
    log::debug!("{} instrument mappings", instruments.len());

    let options = ExportOptions {
        song: cli.song,
        instrument_tracking: if cli.shared_instrument_state {
            InstrumentTracking::Shared
        } else {
            InstrumentTracking::PerChannel
        },
    };
    let mut converter = Converter::new(instruments, options);
    let module = converter
        .load_file(&cli.input, cli.samples.as_deref())
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    print_summary(module);

    let mut sequence = converter.export().context("Failed to export module")?;
    for (indices, solo) in [(&cli.mute, false), (&cli.solo, true)] {
        for &index in indices {
            let track = sequence
                .track_mut(index)
                .ok_or_else(|| anyhow::anyhow!("No output track {index}"))?;
            if solo {
                track.set_solo(true);
            } else {
                track.set_mute(true);
            }
        }
    }
    if !cli.merge && !(cli.mute.is_empty() && cli.solo.is_empty()) {
        log::warn!("--mute and --solo only take effect with --merge");
    }

    let layout = if cli.merge {
        SmfLayout::Merged
    } else {
        SmfLayout::MultiTrack
    };
    let bytes = am_master::sequence_to_smf(&mut sequence, layout)?;
    fs::write(&cli.output, &bytes)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!("Wrote {} ({} bytes)", cli.output.display(), bytes.len());
    Ok(())
}

fn print_summary(module: &Module) {
    println!("Format:      {}", module.format_name());
    match module {
        Module::SonicArranger(sa) => {
            println!("Songs:       {}", sa.songs.len());
            println!("Voices:      {} ({} row groups)", sa.voices.len(), sa.row_groups());
            println!("Notes:       {}", sa.notes.len());
            println!("Instruments: {}", sa.instruments.len());
        }
        Module::HippelCoso(coso) => {
            println!("Songs:       {}", coso.songs.len());
            println!("Voices:      {}", coso.voices.len());
            println!("Patterns:    {}", coso.patterns.len());
            let bytes: usize = coso.samples.iter().map(|s| s.data.len()).sum();
            println!("Samples:     {} ({} bytes)", coso.samples.len(), bytes);
        }
    }
    println!();
}
