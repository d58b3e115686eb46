//! Whole-pipeline tests: module bytes in, MIDI bytes out.

use std::path::PathBuf;

use am_engine::Sequence;
use am_formats::{load_module_bytes, Module};
use am_ir::ChannelCommand;
use am_master::{
    export_module, sequence_to_smf, Converter, ExportOptions, InstrumentMap, SmfLayout,
};

fn push_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Replayer-attached Sonic Arranger file: one song of `rows` row groups,
/// each voice on its own note, with a bit of player code in front.
fn legacy_module(rows: i16) -> Vec<u8> {
    let mut songs = Vec::new();
    for field in [6i16, 1, 0, rows, 0, 50] {
        songs.extend_from_slice(&field.to_be_bytes());
    }
    let mut voices = Vec::new();
    for _ in 0..rows {
        for channel in 0..4i16 {
            voices.extend_from_slice(&channel.to_be_bytes());
            voices.extend_from_slice(&[0, 0]);
        }
    }
    // channel c plays value 49 + 12c with instrument c + 1
    let notes: Vec<u8> = (0..4u8).flat_map(|c| [49 + 12 * c, c + 1, 0, 0]).collect();
    let mut instruments = Vec::new();
    for name in ["Bass", "Pad", "Lead", "Bell"] {
        let mut record = [0u8; 152];
        record[122..122 + name.len()].copy_from_slice(name.as_bytes());
        instruments.extend_from_slice(&record);
    }

    let voice_ptr = 0x28 + songs.len() as i32;
    let note_ptr = voice_ptr + voices.len() as i32;
    let instrument_ptr = note_ptr + notes.len() as i32;
    let synth_ptr = instrument_ptr + instruments.len() as i32;

    let mut out = vec![0x60, 0x00, 0x00, 0x1E, 0x4E, 0x75];
    let marker = out.len();
    for ptr in [0x28, voice_ptr, note_ptr, instrument_ptr, synth_ptr] {
        push_i32(&mut out, ptr);
    }
    out.resize(marker + 0x28, 0);
    out.extend(songs);
    out.extend(voices);
    out.extend(notes);
    out.extend(instruments);
    out
}

const MAP: &str = "# test map\nBass=33\nPad=89\nLead=81\nBell=-1\n";

fn export(data: &[u8]) -> Sequence {
    let module = load_module_bytes(data, None).unwrap();
    export_module(&module, &InstrumentMap::parse(MAP), &ExportOptions::default()).unwrap()
}

fn note_ons(track: &am_engine::Track) -> Vec<(u8, u8)> {
    track
        .iter()
        .filter_map(|e| e.message.as_channel())
        .filter(|m| m.command() == ChannelCommand::NoteOn)
        .map(|m| (m.channel(), m.data1()))
        .collect()
}

#[test]
fn legacy_module_exports_one_voice_per_track() {
    let sequence = export(&legacy_module(3));
    for (channel, track) in sequence.tracks().iter().enumerate() {
        let expected = 48 + 12 * channel as u8;
        assert_eq!(note_ons(track), vec![(channel as u8, expected); 3]);
    }
    assert_eq!(sequence.length(), 36);
}

#[test]
fn merged_track_interleaves_all_voices() {
    let mut sequence = export(&legacy_module(2));
    let merged = sequence.merged_track().clone();

    assert_eq!(note_ons(&merged).len(), 8);
    assert_eq!(merged.length(), 24);
    assert!(merged.events().last().unwrap().message.is_end_of_track());

    // notes of one row start together, ordered by track
    let first_row: Vec<u8> = note_ons(&merged).iter().take(4).map(|&(c, _)| c).collect();
    assert_eq!(first_row, vec![0, 1, 2, 3]);
}

#[test]
fn solo_selects_tracks_in_merged_output() {
    let mut sequence = export(&legacy_module(2));
    sequence.track_mut(2).unwrap().set_solo(true);
    sequence.track_mut(3).unwrap().set_solo(true);
    sequence.track_mut(3).unwrap().set_mute(true);

    let channels: Vec<u8> = note_ons(sequence.merged_track())
        .iter()
        .map(|&(c, _)| c)
        .collect();
    assert_eq!(channels, vec![2, 2]);

    let bytes = sequence_to_smf(&mut sequence, SmfLayout::Merged).unwrap();
    assert_eq!(&bytes[..4], b"MThd");
    assert_eq!(bytes.windows(4).filter(|w| *w == b"MTrk").count(), 1);
}

#[test]
fn converter_loads_files_with_external_samples() {
    let dir = std::env::temp_dir().join(format!("amimus-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let module_path: PathBuf = dir.join("hipc.test");
    let samples_path: PathBuf = dir.join("smp.test");

    // COSO header, two pattern notes, one song, one sample plus terminator
    let mut data = b"COSO".to_vec();
    for offset in [32, 32, 32, 36, 36, 42, 62] {
        push_i32(&mut data, offset);
    }
    data.extend_from_slice(&[0x18, 0x00, 0x1A, 0x00]);
    for field in [0i16, 0, 6] {
        data.extend_from_slice(&field.to_be_bytes());
    }
    push_i32(&mut data, 2);
    data.extend_from_slice(&2u16.to_be_bytes());
    push_i32(&mut data, 0);
    data.extend_from_slice(&[0; 10]);

    std::fs::write(&module_path, &data).unwrap();
    std::fs::write(&samples_path, [9, 9, 1, 2, 3, 4]).unwrap();

    let mut converter = Converter::new(InstrumentMap::new(), ExportOptions::default());
    let module = converter
        .load_file(&module_path, Some(samples_path.as_path()))
        .unwrap();
    let Module::HippelCoso(coso) = module else {
        panic!("expected a COSO module");
    };
    assert_eq!(coso.samples[0].data, vec![1, 2, 3, 4]);

    let mut midi = Vec::new();
    converter.write_midi(&mut midi, SmfLayout::MultiTrack).unwrap();
    assert_eq!(&midi[8..12], &[0, 1, 0, 4]);

    std::fs::remove_dir_all(&dir).unwrap();
}
