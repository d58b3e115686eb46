//! Standard MIDI File writer.

use std::io::{self, Write};

use am_engine::{Sequence, Track};
use am_ir::{MetaMessage, MidiMessage};

/// Largest delta a variable-length quantity can carry.
pub const VLQ_MAX: u32 = 0x0FFF_FFFF;

/// Which SMF format to write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmfLayout {
    /// Format 1: one chunk per track, mute and solo ignored
    #[default]
    MultiTrack,
    /// Format 0: the sequence's merged track, honoring mute and solo
    Merged,
}

pub fn write_smf(
    w: &mut impl Write,
    sequence: &mut Sequence,
    layout: SmfLayout,
) -> io::Result<()> {
    let division = sequence.division();
    match layout {
        SmfLayout::MultiTrack => {
            let count = u16::try_from(sequence.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many tracks"))?;
            write_header(w, 1, count, division)?;
            for track in sequence.tracks() {
                write_track(w, track)?;
            }
            Ok(())
        }
        SmfLayout::Merged => {
            write_header(w, 0, 1, division)?;
            write_track(w, sequence.merged_track())
        }
    }
}

pub fn sequence_to_smf(sequence: &mut Sequence, layout: SmfLayout) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_smf(&mut buf, sequence, layout)?;
    Ok(buf)
}

fn write_header(w: &mut impl Write, format: u16, tracks: u16, division: u16) -> io::Result<()> {
    w.write_all(b"MThd")?;
    w.write_all(&6u32.to_be_bytes())?;
    w.write_all(&format.to_be_bytes())?;
    w.write_all(&tracks.to_be_bytes())?;
    w.write_all(&division.to_be_bytes())
}

fn write_track(w: &mut impl Write, track: &Track) -> io::Result<()> {
    let body = encode_track(track)?;
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "track chunk too large"))?;
    w.write_all(b"MTrk")?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&body)
}

/// Encode a track's events as an `MTrk` body.
///
/// Channel messages use running status. System common and realtime messages
/// have no file representation; their delta moves to the next event. An
/// end-of-track event is appended if the track lacks one.
pub fn encode_track(track: &Track) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut running_status = None;
    let mut carried: u64 = 0;

    for event in track {
        let delta = carried + u64::from(event.ticks);
        carried = 0;
        match &event.message {
            MidiMessage::Channel(msg) => {
                write_vlq(&mut out, delta)?;
                if running_status != Some(msg.status()) {
                    out.push(msg.status());
                    running_status = Some(msg.status());
                }
                out.push(msg.data1());
                if msg.command().data_len() == 2 {
                    out.push(msg.data2());
                }
            }
            MidiMessage::Meta(meta) => {
                write_vlq(&mut out, delta)?;
                write_meta(&mut out, meta)?;
                running_status = None;
                if meta.is_end_of_track() {
                    return Ok(out);
                }
            }
            MidiMessage::SysExclusive(sysex) => {
                write_vlq(&mut out, delta)?;
                out.push(sysex.status());
                write_vlq(&mut out, sysex.data().len() as u64)?;
                out.extend_from_slice(sysex.data());
                running_status = None;
            }
            MidiMessage::SysCommon(_) | MidiMessage::SysRealtime(_) => {
                log::warn!(
                    "status {:#04X} has no MIDI file form, skipped",
                    event.message.status()
                );
                carried = delta;
            }
        }
    }

    write_vlq(&mut out, carried)?;
    write_meta(&mut out, &MetaMessage::end_of_track())?;
    Ok(out)
}

fn write_meta(out: &mut Vec<u8>, meta: &MetaMessage) -> io::Result<()> {
    out.push(MetaMessage::STATUS);
    out.push(meta.meta_type().code());
    write_vlq(out, meta.len() as u64)?;
    out.extend_from_slice(meta.data());
    Ok(())
}

/// Append `value` as a MIDI variable-length quantity.
pub fn write_vlq(out: &mut Vec<u8>, value: u64) -> io::Result<()> {
    if value > u64::from(VLQ_MAX) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("delta {value} exceeds variable-length range"),
        ));
    }
    let mut shift = 21;
    while shift > 0 && value >> shift == 0 {
        shift -= 7;
    }
    while shift > 0 {
        out.push(0x80 | ((value >> shift) & 0x7F) as u8);
        shift -= 7;
    }
    out.push((value & 0x7F) as u8);
    Ok(())
}
