//! Sonic Arranger module decoder.
//!
//! Two layouts exist. Editor files start with `SOAR`, a version and a list of
//! counted chunks (`STBL`, `OVTB`, `NTBL`, `INST`). Files saved with the
//! replayer attached hold the tables after the player code; they are found by
//! scanning for the song table offset (`0x28`), which is followed by the
//! offsets of the remaining tables.

use std::io::{Read, Seek, SeekFrom};

use arrayvec::ArrayString;
use binrw::BinRead;

use crate::reader::ReadBigEndian;
use crate::table::{read_records, read_table};
use crate::FormatError;

const SOAR_MAGIC: [u8; 4] = *b"SOAR";

/// Song table offset as stored in replayer-attached files; also the scan marker.
const SONG_TABLE_OFFSET: i64 = 0x28;
const LEGACY_MARKER: [u8; 4] = (SONG_TABLE_OFFSET as u32).to_be_bytes();

/// Voices per row group.
pub const VOICES_PER_ROW: usize = 4;

pub const SONG_SIZE: usize = 12;
pub const VOICE_SIZE: usize = 4;
pub const NOTE_SIZE: usize = 4;
pub const INSTRUMENT_SIZE: usize = 152;

/// A playback range over the voice table.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct Song {
    /// Ticks per row
    pub speed: i16,
    /// Rows per voice entry
    pub pattern_length: i16,
    /// First row group
    pub start_pos: i16,
    /// Row group after the last one played
    pub stop_pos: i16,
    pub repeat_pos: i16,
    pub irq_rate: i16,
}

/// One channel's entry in a row group.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct Voice {
    /// Index of the first note in the note table
    pub note_address: i16,
    pub sound_transpose: u8,
    pub note_transpose: u8,
}

#[derive(BinRead, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[br(big)]
pub struct Note {
    /// Pitch; 0 is empty
    pub value: u8,
    /// 1-based instrument index; 0 is none
    pub instrument: u8,
    pub command: u8,
    pub command_info: u8,
}

#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct Arpeggio {
    pub length: u8,
    pub repeat: u8,
    pub data: [u8; 14],
}

/// Synth or sample instrument definition.
#[derive(BinRead, Clone, Debug, PartialEq, Eq)]
#[br(big)]
pub struct Instrument {
    pub synth_mode: i16,
    pub sample_wave_no: i16,
    pub length: i16,
    pub repeat: i16,
    #[br(pad_before = 8)]
    pub volume: i16,
    pub fine_tuning: i16,
    pub portamento: i16,
    pub vib_delay: i16,
    pub vib_speed: i16,
    pub vib_level: i16,
    pub amf_wave: i16,
    pub amf_delay: i16,
    pub amf_length: i16,
    pub amf_repeat: i16,
    pub adsr_wave: i16,
    pub adsr_delay: i16,
    pub adsr_length: i16,
    pub adsr_repeat: i16,
    pub sustain_point: i16,
    pub sustain_value: i16,
    #[br(pad_before = 16)]
    pub effect_number: i16,
    pub effect1: i16,
    pub effect2: i16,
    pub effect3: i16,
    pub effect_delay: i16,
    pub arpeggios: [Arpeggio; 3],
    /// Name up to the first NUL; non-ASCII bytes become `?`
    #[br(map = |raw: [u8; 30]| parse_name(&raw))]
    pub name: ArrayString<30>,
}

fn parse_name(raw: &[u8]) -> ArrayString<30> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut name = ArrayString::new();
    for &b in &raw[..end] {
        let c = if b.is_ascii() { b as char } else { '?' };
        if name.try_push(c).is_err() {
            break;
        }
    }
    name
}

/// Which on-disk layout a module was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SonicArrangerVariant {
    /// `SOAR` editor file with its version tag
    Chunked { version: [u8; 4] },
    /// Replayer-attached file; tables are relative to `marker`
    Legacy { marker: u64 },
}

/// A decoded Sonic Arranger module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SonicArrangerModule {
    pub variant: SonicArrangerVariant,
    pub songs: Vec<Song>,
    /// Row groups of [`VOICES_PER_ROW`] entries
    pub voices: Vec<Voice>,
    pub notes: Vec<Note>,
    pub instruments: Vec<Instrument>,
}

impl SonicArrangerModule {
    /// Decode from a stream positioned at the start of the module.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        let start = reader.stream_position()?;
        match reader.read_tag()? {
            Some(SOAR_MAGIC) => Self::read_chunked(reader),
            _ => {
                reader.seek(SeekFrom::Start(start))?;
                Self::read_legacy(reader)
            }
        }
    }

    fn read_chunked<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        let version = reader.read_tag()?.ok_or(FormatError::UnexpectedEof)?;
        let mut module = Self {
            variant: SonicArrangerVariant::Chunked { version },
            songs: Vec::new(),
            voices: Vec::new(),
            notes: Vec::new(),
            instruments: Vec::new(),
        };

        while let Some(tag) = reader.read_tag()? {
            match &tag {
                b"STBL" => module.songs = read_chunk(reader, "songs", 1)?,
                b"OVTB" => module.voices = read_chunk(reader, "voices", VOICES_PER_ROW)?,
                b"NTBL" => module.notes = read_chunk(reader, "notes", 1)?,
                b"INST" => module.instruments = read_chunk(reader, "instruments", 1)?,
                _ => {
                    log::debug!("chunk list ends at tag {:02X?}", tag);
                    break;
                }
            }
        }
        Ok(module)
    }

    fn read_legacy<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        let marker = reader
            .scan_for(&LEGACY_MARKER)?
            .ok_or(FormatError::NotRecognized)?;
        log::debug!("song table marker at {marker:#x}");

        let voice_ptr = i64::from(reader.read_i32_be()?);
        let note_ptr = i64::from(reader.read_i32_be()?);
        let instrument_ptr = i64::from(reader.read_i32_be()?);
        let synth_ptr = i64::from(reader.read_i32_be()?);

        let songs = read_table(reader, marker, "songs", SONG_TABLE_OFFSET, voice_ptr, SONG_SIZE)?;
        let voices = read_table(reader, marker, "voices", voice_ptr, note_ptr, VOICE_SIZE)?;
        let notes = read_table(reader, marker, "notes", note_ptr, instrument_ptr, NOTE_SIZE)?;
        let instruments = read_table(
            reader,
            marker,
            "instruments",
            instrument_ptr,
            synth_ptr,
            INSTRUMENT_SIZE,
        )?;

        Ok(Self {
            variant: SonicArrangerVariant::Legacy { marker },
            songs,
            voices,
            notes,
            instruments,
        })
    }

    /// Number of complete row groups in the voice table.
    pub fn row_groups(&self) -> usize {
        self.voices.len() / VOICES_PER_ROW
    }
}

/// Read a stored count followed by `count * multiplier` records.
fn read_chunk<T, R>(
    reader: &mut R,
    table: &'static str,
    multiplier: usize,
) -> Result<Vec<T>, FormatError>
where
    T: for<'a> BinRead<Args<'a> = ()>,
    R: Read + Seek,
{
    let count = reader.read_i32_be()?;
    let count = usize::try_from(count).map_err(|_| FormatError::NegativeCount {
        table,
        count: i64::from(count),
    })?;
    log::debug!("{table}: {count} entries");
    read_records(reader, count * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn instrument_bytes(name: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; INSTRUMENT_SIZE - 30];
        // volume sits after four fields and 8 pad bytes
        data[16..18].copy_from_slice(&64i16.to_be_bytes());
        let mut raw_name = [0u8; 30];
        raw_name[..name.len()].copy_from_slice(name);
        data.extend_from_slice(&raw_name);
        data
    }

    #[test]
    fn instrument_record_is_152_bytes() {
        let mut cursor = Cursor::new(instrument_bytes(b"Bass\0junk"));
        let instrument: Instrument = binrw::BinReaderExt::read_be(&mut cursor).unwrap();
        assert_eq!(cursor.position(), INSTRUMENT_SIZE as u64);
        assert_eq!(instrument.volume, 64);
        assert_eq!(instrument.name.as_str(), "Bass");
    }

    #[test]
    fn fixed_records_have_expected_sizes() {
        let mut cursor = Cursor::new(vec![0u8; SONG_SIZE + VOICE_SIZE + NOTE_SIZE]);
        let _: Song = binrw::BinReaderExt::read_be(&mut cursor).unwrap();
        assert_eq!(cursor.position(), SONG_SIZE as u64);
        let _: Voice = binrw::BinReaderExt::read_be(&mut cursor).unwrap();
        let _: Note = binrw::BinReaderExt::read_be(&mut cursor).unwrap();
        assert_eq!(cursor.position(), (SONG_SIZE + VOICE_SIZE + NOTE_SIZE) as u64);
    }

    #[test]
    fn name_stops_at_nul_and_masks_high_bytes() {
        assert_eq!(parse_name(b"Lead\0Strings").as_str(), "Lead");
        assert_eq!(parse_name(&[b'A', 0xE9, b'B']).as_str(), "A?B");
        assert_eq!(parse_name(&[b'x'; 30]).len(), 30);
    }

    #[test]
    fn negative_chunk_count_rejected() {
        let mut data = b"SOARV1.0STBL".to_vec();
        data.extend_from_slice(&(-1i32).to_be_bytes());
        let err = SonicArrangerModule::read(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(
            err,
            FormatError::NegativeCount {
                table: "songs",
                count: -1
            }
        ));
    }

    #[test]
    fn legacy_without_marker_not_recognized() {
        let data = vec![0x4E, 0x75, 0, 0, 0, 0x27, 0, 0];
        let err = SonicArrangerModule::read(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, FormatError::NotRecognized));
    }
}
