//! Conversion of decoded modules into four-track MIDI sequences.

use am_engine::{Sequence, Track, TrackError};
use am_formats::{HippelCosoModule, PatternEvent, SonicArrangerModule};
use am_ir::{ChannelMessage, MessageError, MetaMessage, MidiEvent, MidiMessage};
use thiserror::Error;

use crate::instrument_map::{InstrumentMap, Mapping};

/// Tracks in every exported sequence, one per Amiga voice.
pub const TRACKS: usize = 4;
/// Ticks per quarter note.
pub const DIVISION: u16 = 12;
/// Length of every exported note.
pub const NOTE_TICKS: u32 = 12;
pub const VELOCITY: u8 = 100;

/// BPM numerator for Sonic Arranger song speed.
pub const SONIC_ARRANGER_TEMPO_SCALE: i32 = 2956;
/// BPM numerator for Hippel COSO song speed.
pub const HIPPEL_COSO_TEMPO_SCALE: i32 = 3000;

/// Instruments at or above this index share the last channel.
const DIRECT_CHANNELS: usize = 15;
const DRUM_CHANNEL: usize = 9;
const SHARED_CHANNEL: u8 = 15;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("song {index} out of range for module with {count} songs")]
    SongOutOfRange { index: usize, count: usize },
    /// Speed is not positive, or so large the tempo does not fit 24 bits
    #[error("song speed {0} gives no usable tempo")]
    InvalidSpeed(i16),
    #[error("voice {index} out of range for table of {count} voices")]
    VoiceOutOfRange { index: i64, count: usize },
    #[error("note {index} out of range for table of {count} notes")]
    NoteOutOfRange { index: i64, count: usize },
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Which tracks remember the last instrument sent to the shared channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstrumentTracking {
    /// One memory across all four tracks
    Shared,
    /// One memory per track
    #[default]
    PerChannel,
}

/// Export settings.
///
/// The default remembers the last shared-channel instrument per track
/// ([`InstrumentTracking::PerChannel`]), not once per export call.
/// [`InstrumentTracking::Shared`] keeps a single value across all four tracks,
/// matching the output of earlier amimus releases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Index of the song to export
    pub song: usize,
    pub instrument_tracking: InstrumentTracking,
}

/// Accumulates a track, folding rests into the next event's delta.
struct TrackBuilder {
    track: Track,
    pending: u32,
}

impl TrackBuilder {
    fn new() -> Self {
        Self {
            track: Track::new(),
            pending: 0,
        }
    }

    fn emit(&mut self, message: impl Into<MidiMessage>) {
        let ticks = std::mem::take(&mut self.pending);
        self.track.push(MidiEvent::new(message, ticks));
    }

    fn rest(&mut self, ticks: u32) {
        self.pending = self.pending.saturating_add(ticks);
    }

    /// A note of `NOTE_TICKS`, or a rest if `pitch` is outside the MIDI range.
    fn note(&mut self, channel: u8, pitch: i32) -> Result<(), MessageError> {
        let Some(key) = u8::try_from(pitch).ok().filter(|&k| k <= 127) else {
            if pitch != -1 {
                log::warn!("pitch {pitch} outside MIDI range, exported as a rest");
            }
            self.rest(NOTE_TICKS);
            return Ok(());
        };
        self.emit(ChannelMessage::note_on(channel, key, VELOCITY)?);
        self.track.push(MidiEvent::new(
            ChannelMessage::note_off(channel, key, 0)?,
            NOTE_TICKS,
        ));
        Ok(())
    }

    fn finish(mut self) -> Track {
        let ticks = std::mem::take(&mut self.pending);
        self.track.push(MidiEvent::end_of_track(ticks));
        self.track
    }
}

/// Tempo and 4/4 time signature at the start of every track.
fn start_tracks(scale: i32, speed: i16) -> Result<Vec<TrackBuilder>, ExportError> {
    let bpm = match speed {
        s if s > 0 => scale / i32::from(s),
        _ => 0,
    };
    if bpm <= 0 {
        return Err(ExportError::InvalidSpeed(speed));
    }
    let micros = 60_000_000 / bpm as u32;
    if micros > MetaMessage::TEMPO_MAX {
        return Err(ExportError::InvalidSpeed(speed));
    }
    log::debug!("speed {speed}: {bpm} BPM, {micros} us per quarter");

    let mut builders = Vec::with_capacity(TRACKS);
    for _ in 0..TRACKS {
        let mut builder = TrackBuilder::new();
        builder.emit(MetaMessage::tempo(micros)?);
        builder.emit(MetaMessage::time_signature(4, 2, 24, 8));
        builders.push(builder);
    }
    Ok(builders)
}

fn finish_sequence(builders: Vec<TrackBuilder>) -> Sequence {
    let mut sequence = Sequence::new(DIVISION);
    for builder in builders {
        sequence.add(builder.finish());
    }
    sequence
}

/// Program mapped for an instrument, if any. Missing instruments are logged.
fn program_for(module: &SonicArrangerModule, map: &InstrumentMap, index: usize) -> Option<u8> {
    let Some(instrument) = module.instruments.get(index) else {
        log::warn!("instrument {} has no definition", index + 1);
        return None;
    };
    match map.get(&instrument.name) {
        Some(Mapping::Program(program)) => Some(program),
        _ => None,
    }
}

/// Last instrument sent to the shared channel, per the tracking mode.
struct SharedChannelState {
    tracking: InstrumentTracking,
    last: [Option<usize>; TRACKS],
}

impl SharedChannelState {
    fn slot(&mut self, track: usize) -> &mut Option<usize> {
        match self.tracking {
            InstrumentTracking::Shared => &mut self.last[0],
            InstrumentTracking::PerChannel => &mut self.last[track],
        }
    }
}

/// Export one Sonic Arranger song.
///
/// Instrument `i` (0-based) plays on MIDI channel `i` when `i < 15` and
/// `i != 9`, with its program selected once at the start of every track.
/// Other instruments play on channel 15 and select their program whenever
/// the tracked instrument changes.
pub fn export_sonic_arranger(
    module: &SonicArrangerModule,
    map: &InstrumentMap,
    options: &ExportOptions,
) -> Result<Sequence, ExportError> {
    let song = module
        .songs
        .get(options.song)
        .ok_or(ExportError::SongOutOfRange {
            index: options.song,
            count: module.songs.len(),
        })?;
    let mut tracks = start_tracks(SONIC_ARRANGER_TEMPO_SCALE, song.speed)?;

    for (index, instrument) in module.instruments.iter().enumerate() {
        let program = match map.get(&instrument.name) {
            Some(Mapping::Program(program)) => {
                log::info!("{program} set for {}", instrument.name);
                program
            }
            Some(Mapping::Disabled) => continue,
            None => {
                log::warn!("unknown instrument {}", instrument.name);
                continue;
            }
        };
        if index < DIRECT_CHANNELS && index != DRUM_CHANNEL {
            for track in &mut tracks {
                track.emit(ChannelMessage::program_change(index as u8, program)?);
            }
        }
    }

    let mut shared = SharedChannelState {
        tracking: options.instrument_tracking,
        last: [None; TRACKS],
    };
    for row in i64::from(song.start_pos)..i64::from(song.stop_pos) {
        for (channel, track) in tracks.iter_mut().enumerate() {
            let voice_index = row * TRACKS as i64 + channel as i64;
            let voice = usize::try_from(voice_index)
                .ok()
                .and_then(|i| module.voices.get(i))
                .ok_or(ExportError::VoiceOutOfRange {
                    index: voice_index,
                    count: module.voices.len(),
                })?;

            for step in 0..i64::from(song.pattern_length) {
                let note_index = i64::from(voice.note_address) + step;
                let note = usize::try_from(note_index)
                    .ok()
                    .and_then(|i| module.notes.get(i))
                    .ok_or(ExportError::NoteOutOfRange {
                        index: note_index,
                        count: module.notes.len(),
                    })?;
                let pitch = i32::from(note.value) - 1;

                let Some(instrument) = usize::from(note.instrument).checked_sub(1) else {
                    track.rest(NOTE_TICKS);
                    continue;
                };
                if instrument < DIRECT_CHANNELS && instrument != DRUM_CHANNEL {
                    track.note(instrument as u8, pitch)?;
                    continue;
                }

                let last = shared.slot(channel);
                if *last != Some(instrument) {
                    if let Some(program) = program_for(module, map, instrument) {
                        track.emit(ChannelMessage::program_change(SHARED_CHANNEL, program)?);
                    }
                    *last = Some(instrument);
                }
                track.note(SHARED_CHANNEL, pitch)?;
            }
        }
    }

    Ok(finish_sequence(tracks))
}

/// Export a Hippel COSO module.
///
/// Every note record of the pattern table goes to track 0 on channel 0 in
/// table order; command records are skipped. The other tracks only carry
/// tempo and time signature.
pub fn export_hippel_coso(
    module: &HippelCosoModule,
    options: &ExportOptions,
) -> Result<Sequence, ExportError> {
    let song = module
        .songs
        .get(options.song)
        .ok_or(ExportError::SongOutOfRange {
            index: options.song,
            count: module.songs.len(),
        })?;
    let mut tracks = start_tracks(HIPPEL_COSO_TEMPO_SCALE, song.speed)?;

    let lead = &mut tracks[0];
    for event in &module.patterns {
        if let PatternEvent::Note { value, .. } = *event {
            lead.note(0, i32::from(value) * 2 - 1)?;
        }
    }

    Ok(finish_sequence(tracks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_folds_rests_into_next_delta() {
        let mut builder = TrackBuilder::new();
        builder.rest(12);
        builder.note(0, -1).unwrap();
        builder.note(2, 60).unwrap();
        builder.rest(5);
        let track = builder.finish();

        let deltas: Vec<u32> = track.iter().map(|e| e.ticks).collect();
        assert_eq!(deltas, vec![24, NOTE_TICKS, 5]);
        let on = track.get(0).unwrap().message.as_channel().copied().unwrap();
        assert_eq!((on.channel(), on.data1(), on.data2()), (2, 60, VELOCITY));
        assert!(track.get(2).unwrap().message.is_end_of_track());
    }

    #[test]
    fn out_of_range_pitch_is_rest() {
        let mut builder = TrackBuilder::new();
        builder.note(0, 128).unwrap();
        let track = builder.finish();
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(0).unwrap().ticks, NOTE_TICKS);
    }

    #[test]
    fn tempo_from_speed() {
        let tracks = start_tracks(SONIC_ARRANGER_TEMPO_SCALE, 6).unwrap();
        let track = tracks.into_iter().next().unwrap().finish();
        let tempo = track.get(0).unwrap().message.as_meta().unwrap();
        // 2956 / 6 = 492 BPM
        assert_eq!(tempo.tempo_value().unwrap(), 60_000_000 / 492);
    }

    #[test]
    fn unusable_speeds_rejected() {
        assert!(matches!(
            start_tracks(HIPPEL_COSO_TEMPO_SCALE, 0),
            Err(ExportError::InvalidSpeed(0))
        ));
        assert!(matches!(
            start_tracks(HIPPEL_COSO_TEMPO_SCALE, -3),
            Err(ExportError::InvalidSpeed(-3))
        ));
        assert!(matches!(
            start_tracks(HIPPEL_COSO_TEMPO_SCALE, 3001),
            Err(ExportError::InvalidSpeed(3001))
        ));
    }

    #[test]
    fn default_tracking_is_per_channel() {
        assert_eq!(
            ExportOptions::default().instrument_tracking,
            InstrumentTracking::PerChannel
        );
    }

    #[test]
    fn slowest_tempo_must_fit_meta_payload() {
        // 2956 / 739 = 4 BPM, 15 s per quarter
        assert!(start_tracks(SONIC_ARRANGER_TEMPO_SCALE, 739).is_ok());
        // 2956 / 740 = 3 BPM, 20 s per quarter exceeds 24 bits
        assert!(matches!(
            start_tracks(SONIC_ARRANGER_TEMPO_SCALE, 740),
            Err(ExportError::InvalidSpeed(740))
        ));
    }
}
