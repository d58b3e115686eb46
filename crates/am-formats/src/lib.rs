//! Format decoders for amimus.
//!
//! Decodes Sonic Arranger and Hippel COSO modules. Neither format stores
//! its table sizes: every record count is derived from the distance between
//! two table offsets in the header.

mod hippel_coso;
mod reader;
mod sonic_arranger;
mod table;

use std::io::{Cursor, Read, Seek, SeekFrom};

pub use hippel_coso::{
    CosoHeader, CosoSample, CosoSong, CosoVoice, HippelCosoModule, PatternEvent, TfmxSummary,
};
pub use reader::ReadBigEndian;
pub use sonic_arranger::{
    Arpeggio, Instrument, Note, SonicArrangerModule, SonicArrangerVariant, Song, Voice,
};
pub use table::derive_count;

use thiserror::Error;

/// Error type for module decoding.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Signature did not match; another decoder may still accept the stream
    #[error("module signature not recognized")]
    NotRecognized,
    /// Stream ended inside a header, table or sample block
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// A table starts after the table that should follow it
    #[error("{table} table ends at {next:#x} before it starts at {this:#x}")]
    NonMonotonicOffsets { table: &'static str, this: i64, next: i64 },
    /// Table span is not a whole number of records
    #[error("{table} table spans {span} bytes, not a multiple of {record_size}")]
    MisalignedTable {
        table: &'static str,
        span: i64,
        record_size: usize,
    },
    #[error("{table} table has negative offset {offset}")]
    NegativeOffset { table: &'static str, offset: i64 },
    #[error("{table} table has negative record count {count}")]
    NegativeCount { table: &'static str, count: i64 },
    /// Sample payload range falls outside the sample data buffer
    #[error("sample {index} ({offset}+{length}) exceeds {available} bytes of sample data")]
    SampleOutOfBounds {
        index: usize,
        offset: i64,
        length: usize,
        available: usize,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`FormatError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not this format; try the next decoder
    Recognition,
    /// Header offsets or sample ranges are inconsistent
    Structural,
    EndOfStream,
    Io,
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::NotRecognized => ErrorKind::Recognition,
            FormatError::UnexpectedEof => ErrorKind::EndOfStream,
            FormatError::NonMonotonicOffsets { .. }
            | FormatError::MisalignedTable { .. }
            | FormatError::NegativeOffset { .. }
            | FormatError::NegativeCount { .. }
            | FormatError::SampleOutOfBounds { .. }
            | FormatError::Parse(_) => ErrorKind::Structural,
            FormatError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return FormatError::UnexpectedEof;
        }
        match err {
            binrw::Error::Io(io) => FormatError::Io(io),
            other => FormatError::Parse(other.to_string()),
        }
    }
}

/// A decoded module of any supported format.
#[derive(Clone, Debug)]
pub enum Module {
    SonicArranger(SonicArrangerModule),
    HippelCoso(HippelCosoModule),
}

impl Module {
    pub fn format_name(&self) -> &'static str {
        match self {
            Module::SonicArranger(_) => "Sonic Arranger",
            Module::HippelCoso(_) => "Hippel COSO",
        }
    }
}

type Decoder<R> = fn(&mut R, Option<&[u8]>) -> Result<Module, FormatError>;

fn decode_hippel_coso<R: Read + Seek>(
    reader: &mut R,
    sample_data: Option<&[u8]>,
) -> Result<Module, FormatError> {
    HippelCosoModule::read(reader, sample_data).map(Module::HippelCoso)
}

fn decode_sonic_arranger<R: Read + Seek>(
    reader: &mut R,
    sample_data: Option<&[u8]>,
) -> Result<Module, FormatError> {
    if let Some(data) = sample_data {
        log::warn!(
            "Sonic Arranger modules carry their own samples; ignoring {} bytes of sample data",
            data.len()
        );
    }
    SonicArrangerModule::read(reader).map(Module::SonicArranger)
}

/// Decode a module from a seekable stream positioned at its first byte.
///
/// Decoders are tried in order (Hippel COSO, then Sonic Arranger), each from
/// the starting position. A decoder that does not recognize the stream hands
/// over to the next one; any other error ends the search.
///
/// `sample_data` is an external sample blob for formats that keep samples
/// in a separate file. Sonic Arranger modules ignore it with a warning.
pub fn load_module<R: Read + Seek>(
    reader: &mut R,
    sample_data: Option<&[u8]>,
) -> Result<Module, FormatError> {
    let start = reader.stream_position()?;
    let decoders: [(&str, Decoder<R>); 2] = [
        ("Hippel COSO", decode_hippel_coso::<R>),
        ("Sonic Arranger", decode_sonic_arranger::<R>),
    ];

    for (name, decode) in decoders {
        reader.seek(SeekFrom::Start(start))?;
        match decode(reader, sample_data) {
            Err(FormatError::NotRecognized) => log::debug!("not a {name} module"),
            result => {
                if result.is_ok() {
                    log::debug!("decoded {name} module");
                }
                return result;
            }
        }
    }
    Err(FormatError::NotRecognized)
}

/// Decode a module held in memory.
pub fn load_module_bytes(data: &[u8], sample_data: Option<&[u8]>) -> Result<Module, FormatError> {
    load_module(&mut Cursor::new(data), sample_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(FormatError::NotRecognized.kind(), ErrorKind::Recognition);
        assert_eq!(FormatError::UnexpectedEof.kind(), ErrorKind::EndOfStream);
        assert_eq!(
            FormatError::NonMonotonicOffsets {
                table: "songs",
                this: 8,
                next: 4
            }
            .kind(),
            ErrorKind::Structural
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(FormatError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn error_display() {
        let err = FormatError::MisalignedTable {
            table: "notes",
            span: 10,
            record_size: 4,
        };
        assert_eq!(
            err.to_string(),
            "notes table spans 10 bytes, not a multiple of 4"
        );
    }

    #[test]
    fn unknown_bytes_not_recognized() {
        let err = load_module_bytes(b"MOD!nothing to see here", None).unwrap_err();
        assert!(matches!(err, FormatError::NotRecognized));
        let err = load_module_bytes(&[], None).unwrap_err();
        assert!(matches!(err, FormatError::NotRecognized));
    }
}
