//! Hippel COSO module decoder.
//!
//! The header holds seven absolute table offsets. Sample payloads live either
//! after the last table or in a separate sample file.

use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, BinReaderExt};

use crate::reader::ReadBigEndian;
use crate::table::{derive_count, read_records, read_table};
use crate::FormatError;

const COSO_MAGIC: [u8; 4] = *b"COSO";

pub const PATTERN_SIZE: usize = 2;
pub const VOICE_SIZE: usize = 3;
pub const SONG_SIZE: usize = 6;
pub const SAMPLE_SIZE: usize = 10;

/// Table offsets following the `COSO` magic, relative to the module start.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct CosoHeader {
    pub frequency_sequences: i32,
    pub volume_sequences: i32,
    pub patterns: i32,
    pub voices: i32,
    pub songs: i32,
    pub sample_headers: i32,
    pub sample_data: i32,
}

/// Optional `TFMX` block after the header. Informational only.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big, magic = b"TFMX")]
pub struct TfmxSummary {
    #[br(pad_before = 6)]
    pub last_pattern: i16,
    #[br(pad_before = 4)]
    pub songs: i16,
    pub samples: i16,
}

impl TfmxSummary {
    pub fn pattern_count(&self) -> i32 {
        i32::from(self.last_pattern) + 1
    }
}

/// One two-byte pattern record.
///
/// The first byte is either a command sentinel or a note value, never both.
#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub enum PatternEvent {
    #[br(magic = 0xFFu8)]
    Transpose(u8),
    #[br(magic = 0xFEu8)]
    Speed(u8),
    #[br(magic = 0xFDu8)]
    SpeedLoop(u8),
    Note { value: u8, info: u8 },
}

impl PatternEvent {
    pub fn note_value(&self) -> Option<u8> {
        match *self {
            PatternEvent::Note { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct CosoVoice {
    pub pattern_address: u8,
    pub transpose: u8,
    pub volume_transpose: u8,
}

#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(big)]
pub struct CosoSong {
    pub start: i16,
    pub end: i16,
    pub speed: i16,
}

/// A sample header plus its copied payload.
#[derive(BinRead, Clone, Debug, PartialEq, Eq)]
#[br(big)]
pub struct CosoSample {
    /// Byte offset into the sample data
    pub source_offset: i32,
    /// Length in bytes (stored as a word count)
    #[br(map = |words: u16| usize::from(words) * 2)]
    pub source_length: usize,
    pub loop_start: i32,
    #[br(ignore)]
    pub data: Vec<u8>,
}

/// A decoded Hippel COSO module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HippelCosoModule {
    pub header: CosoHeader,
    pub tfmx: Option<TfmxSummary>,
    pub samples: Vec<CosoSample>,
    pub songs: Vec<CosoSong>,
    pub voices: Vec<CosoVoice>,
    pub patterns: Vec<PatternEvent>,
}

impl HippelCosoModule {
    /// Decode from a stream positioned at the start of the module.
    ///
    /// Without `sample_data`, the sample block is read from the module
    /// itself, just long enough to cover every sample header.
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        sample_data: Option<&[u8]>,
    ) -> Result<Self, FormatError> {
        let start = reader.stream_position()?;
        if reader.read_tag()? != Some(COSO_MAGIC) {
            return Err(FormatError::NotRecognized);
        }
        let header: CosoHeader = reader.read_be()?;
        let tfmx = read_tfmx(reader)?;
        if let Some(tfmx) = &tfmx {
            log::debug!(
                "TFMX summary: {} patterns, {} songs, {} samples",
                tfmx.pattern_count(),
                tfmx.songs,
                tfmx.samples
            );
        }

        let header_span = derive_count(
            "sample headers",
            i64::from(header.sample_headers),
            i64::from(header.sample_data),
            SAMPLE_SIZE,
        )?;
        // The last header slot is a terminator.
        let sample_count = header_span
            .checked_sub(1)
            .ok_or(FormatError::NegativeCount {
                table: "sample headers",
                count: -1,
            })?;
        reader.seek(SeekFrom::Start(start + header.sample_headers as u64))?;
        let mut samples: Vec<CosoSample> = read_records(reader, sample_count)?;

        let owned;
        let sample_data = match sample_data {
            Some(data) => data,
            None => {
                owned = read_sample_block(reader, start, &header, &samples)?;
                &owned[..]
            }
        };
        fill_samples(&mut samples, sample_data)?;

        let songs = read_table(
            reader,
            start,
            "songs",
            i64::from(header.songs),
            i64::from(header.sample_headers),
            SONG_SIZE,
        )?;
        let voices = read_table(
            reader,
            start,
            "voices",
            i64::from(header.voices),
            i64::from(header.songs),
            VOICE_SIZE,
        )?;
        let patterns = read_table(
            reader,
            start,
            "patterns",
            i64::from(header.patterns),
            i64::from(header.voices),
            PATTERN_SIZE,
        )?;

        Ok(Self {
            header,
            tfmx,
            samples,
            songs,
            voices,
            patterns,
        })
    }
}

/// The optional `TFMX` block. A missing magic or a short stream means absent.
fn read_tfmx<R: Read + Seek>(reader: &mut R) -> Result<Option<TfmxSummary>, FormatError> {
    match reader.read_be::<TfmxSummary>() {
        Ok(summary) => Ok(Some(summary)),
        Err(err) if err.is_eof() || matches!(err.root_cause(), binrw::Error::BadMagic { .. }) => {
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Read the in-module sample block, sized to the furthest sample end.
fn read_sample_block<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    header: &CosoHeader,
    samples: &[CosoSample],
) -> Result<Vec<u8>, FormatError> {
    let mut end = 0usize;
    for (index, sample) in samples.iter().enumerate() {
        let offset = usize::try_from(sample.source_offset)
            .map_err(|_| out_of_bounds(index, sample, 0))?;
        end = end.max(offset + sample.source_length);
    }
    log::debug!("reading {end} bytes of sample data at {:#x}", header.sample_data);
    reader.seek(SeekFrom::Start(start + header.sample_data as u64))?;
    let mut block = Vec::new();
    reader.by_ref().take(end as u64).read_to_end(&mut block)?;
    if block.len() < end {
        return Err(FormatError::UnexpectedEof);
    }
    Ok(block)
}

/// Copy each sample's payload out of `data` into its own buffer.
fn fill_samples(samples: &mut [CosoSample], data: &[u8]) -> Result<(), FormatError> {
    for (index, sample) in samples.iter_mut().enumerate() {
        let range = usize::try_from(sample.source_offset)
            .ok()
            .and_then(|offset| Some(offset..offset.checked_add(sample.source_length)?))
            .filter(|range| range.end <= data.len())
            .ok_or_else(|| out_of_bounds(index, sample, data.len()))?;
        sample.data = data[range].to_vec();
    }
    Ok(())
}

fn out_of_bounds(index: usize, sample: &CosoSample, available: usize) -> FormatError {
    FormatError::SampleOutOfBounds {
        index,
        offset: i64::from(sample.source_offset),
        length: sample.source_length,
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn pattern_sentinels_decode_as_commands() {
        let mut cursor = Cursor::new(vec![0xFF, 3, 0xFE, 6, 0xFD, 2, 0x18, 0x40]);
        let events: Vec<PatternEvent> = read_records(&mut cursor, 4).unwrap();
        assert_eq!(
            events,
            vec![
                PatternEvent::Transpose(3),
                PatternEvent::Speed(6),
                PatternEvent::SpeedLoop(2),
                PatternEvent::Note {
                    value: 0x18,
                    info: 0x40
                },
            ]
        );
        assert_eq!(events[3].note_value(), Some(0x18));
        assert_eq!(events[0].note_value(), None);
    }

    #[test]
    fn sample_length_is_doubled() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 8, 0, 5, 0, 0, 0, 2]);
        let sample: CosoSample = cursor.read_be().unwrap();
        assert_eq!(cursor.position(), SAMPLE_SIZE as u64);
        assert_eq!(sample.source_offset, 8);
        assert_eq!(sample.source_length, 10);
        assert_eq!(sample.loop_start, 2);
        assert!(sample.data.is_empty());
    }

    #[test]
    fn voice_reads_three_distinct_bytes() {
        let mut cursor = Cursor::new(vec![7, 1, 2]);
        let voice: CosoVoice = cursor.read_be().unwrap();
        assert_eq!(
            voice,
            CosoVoice {
                pattern_address: 7,
                transpose: 1,
                volume_transpose: 2
            }
        );
    }

    #[test]
    fn fill_copies_independent_payloads() {
        let mut samples = vec![
            CosoSample {
                source_offset: 0,
                source_length: 4,
                loop_start: 0,
                data: Vec::new(),
            },
            CosoSample {
                source_offset: 2,
                source_length: 4,
                loop_start: 0,
                data: Vec::new(),
            },
        ];
        fill_samples(&mut samples, &[1, 2, 3, 4, 5, 6]).unwrap();
        samples[0].data[2] = 99;
        assert_eq!(samples[0].data, vec![1, 2, 99, 4]);
        assert_eq!(samples[1].data, vec![3, 4, 5, 6]);
    }

    #[test]
    fn fill_rejects_out_of_range_payloads() {
        let mut samples = vec![CosoSample {
            source_offset: 4,
            source_length: 4,
            loop_start: 0,
            data: Vec::new(),
        }];
        assert!(matches!(
            fill_samples(&mut samples, &[0; 6]),
            Err(FormatError::SampleOutOfBounds {
                index: 0,
                offset: 4,
                length: 4,
                available: 6
            })
        ));

        samples[0].source_offset = -2;
        assert!(matches!(
            fill_samples(&mut samples, &[0; 16]),
            Err(FormatError::SampleOutOfBounds { offset: -2, .. })
        ));
    }

    /// Cursor that fails every read at or past `limit`.
    struct FailAt {
        inner: Cursor<Vec<u8>>,
        limit: u64,
    }

    impl Read for FailAt {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let left = self.limit.saturating_sub(self.inner.position());
            if left == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "bad sector"));
            }
            let n = buf.len().min(left as usize);
            self.inner.read(&mut buf[..n])
        }
    }

    impl Seek for FailAt {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn header_bytes() -> Vec<u8> {
        let mut data = COSO_MAGIC.to_vec();
        data.extend_from_slice(&[0; 28]);
        data
    }

    #[test]
    fn tfmx_absent_on_other_magic_or_short_stream() {
        let mut data = header_bytes();
        data.extend_from_slice(b"NOPE");
        let mut cursor = Cursor::new(data);
        cursor.set_position(32);
        assert_eq!(read_tfmx(&mut cursor).unwrap(), None);

        let mut cursor = Cursor::new(b"TFMX\0\0".to_vec());
        assert_eq!(read_tfmx(&mut cursor).unwrap(), None);
    }

    #[test]
    fn io_error_after_header_is_not_swallowed() {
        let mut reader = FailAt {
            inner: Cursor::new(header_bytes()),
            limit: 32,
        };
        let err = HippelCosoModule::read(&mut reader, None).unwrap_err();
        assert!(matches!(err, FormatError::Io(_)));
    }

    #[test]
    fn oversized_sample_block_is_eof() {
        let header = CosoHeader {
            frequency_sequences: 0,
            volume_sequences: 0,
            patterns: 0,
            voices: 0,
            songs: 0,
            sample_headers: 0,
            sample_data: 0,
        };
        let samples = [CosoSample {
            source_offset: 0x7FFF_0000,
            source_length: 0x1_FFFE,
            loop_start: 0,
            data: Vec::new(),
        }];
        let mut cursor = Cursor::new(vec![0u8; 64]);
        let err = read_sample_block(&mut cursor, 0, &header, &samples).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEof));
    }

    #[test]
    fn wrong_magic_not_recognized() {
        let err = HippelCosoModule::read(&mut Cursor::new(b"SOAR....".to_vec()), None).unwrap_err();
        assert!(matches!(err, FormatError::NotRecognized));
    }
}
