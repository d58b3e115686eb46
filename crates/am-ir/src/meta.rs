//! Meta messages (status 0xFF in a MIDI file).

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::MessageError;

/// Meta event type tag.
///
/// Equality and hashing go by the type byte, so `Other(0x51)` equals `Tempo`.
#[derive(Clone, Copy, Debug)]
pub enum MetaType {
    SequenceNumber,
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
    EndOfTrack,
    Tempo,
    SmpteOffset,
    TimeSignature,
    KeySignature,
    ProprietaryEvent,
    /// Any type byte without a dedicated variant
    Other(u8),
}

impl MetaType {
    /// The type byte written after 0xFF.
    pub const fn code(self) -> u8 {
        match self {
            MetaType::SequenceNumber => 0x00,
            MetaType::Text => 0x01,
            MetaType::Copyright => 0x02,
            MetaType::TrackName => 0x03,
            MetaType::InstrumentName => 0x04,
            MetaType::Lyric => 0x05,
            MetaType::Marker => 0x06,
            MetaType::CuePoint => 0x07,
            MetaType::ProgramName => 0x08,
            MetaType::DeviceName => 0x09,
            MetaType::EndOfTrack => 0x2F,
            MetaType::Tempo => 0x51,
            MetaType::SmpteOffset => 0x54,
            MetaType::TimeSignature => 0x58,
            MetaType::KeySignature => 0x59,
            MetaType::ProprietaryEvent => 0x7F,
            MetaType::Other(code) => code,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => MetaType::SequenceNumber,
            0x01 => MetaType::Text,
            0x02 => MetaType::Copyright,
            0x03 => MetaType::TrackName,
            0x04 => MetaType::InstrumentName,
            0x05 => MetaType::Lyric,
            0x06 => MetaType::Marker,
            0x07 => MetaType::CuePoint,
            0x08 => MetaType::ProgramName,
            0x09 => MetaType::DeviceName,
            0x2F => MetaType::EndOfTrack,
            0x51 => MetaType::Tempo,
            0x54 => MetaType::SmpteOffset,
            0x58 => MetaType::TimeSignature,
            0x59 => MetaType::KeySignature,
            0x7F => MetaType::ProprietaryEvent,
            other => MetaType::Other(other),
        }
    }

    /// The dedicated variant for this type byte, if there is one.
    pub const fn normalized(self) -> Self {
        Self::from_code(self.code())
    }

    /// Payload length required by this type, if it has exactly one.
    pub const fn fixed_length(self) -> Option<usize> {
        match self.normalized() {
            MetaType::EndOfTrack => Some(0),
            MetaType::Tempo => Some(3),
            MetaType::SmpteOffset => Some(5),
            MetaType::TimeSignature => Some(4),
            MetaType::KeySignature => Some(2),
            _ => None,
        }
    }

    /// Check a payload length against the per-type length table.
    pub const fn accepts_length(self, length: usize) -> bool {
        match self.normalized() {
            // Either empty (use track index) or a 16-bit number.
            MetaType::SequenceNumber => length == 0 || length == 2,
            _ => match self.fixed_length() {
                Some(required) => length == required,
                None => true,
            },
        }
    }
}

impl PartialEq for MetaType {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for MetaType {}

impl core::hash::Hash for MetaType {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

/// A meta message: a type tag plus a variable-length payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetaMessage {
    meta_type: MetaType,
    data: Vec<u8>,
}

impl MetaMessage {
    /// Status byte shared by every meta message.
    pub const STATUS: u8 = 0xFF;

    /// Largest tempo the 24-bit payload can carry.
    pub const TEMPO_MAX: u32 = 0x00FF_FFFF;

    /// Build a meta message from a payload, validating its length.
    pub fn new(meta_type: MetaType, data: impl Into<Vec<u8>>) -> Result<Self, MessageError> {
        let meta_type = meta_type.normalized();
        let data = data.into();
        if !meta_type.accepts_length(data.len()) {
            return Err(MessageError::MetaLengthOutOfRange {
                meta_type,
                length: data.len(),
            });
        }
        Ok(Self { meta_type, data })
    }

    /// Build a zero-filled meta message of the given length.
    pub fn with_length(meta_type: MetaType, length: usize) -> Result<Self, MessageError> {
        Self::new(meta_type, vec![0u8; length])
    }

    /// Tempo in microseconds per quarter note.
    pub fn tempo(micros_per_quarter: u32) -> Result<Self, MessageError> {
        if micros_per_quarter > Self::TEMPO_MAX {
            return Err(MessageError::TempoOutOfRange(micros_per_quarter));
        }
        let [_, hi, mid, lo] = micros_per_quarter.to_be_bytes();
        Ok(Self {
            meta_type: MetaType::Tempo,
            data: vec![hi, mid, lo],
        })
    }

    /// Time signature: numerator, denominator as a power of two, MIDI clocks
    /// per metronome click and notated 32nd notes per quarter note.
    pub fn time_signature(
        numerator: u8,
        denominator_pow2: u8,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    ) -> Self {
        Self {
            meta_type: MetaType::TimeSignature,
            data: vec![
                numerator,
                denominator_pow2,
                clocks_per_click,
                thirty_seconds_per_quarter,
            ],
        }
    }

    pub fn end_of_track() -> Self {
        Self {
            meta_type: MetaType::EndOfTrack,
            data: Vec::new(),
        }
    }

    /// A text-like meta message (track name, marker, lyric, ...).
    pub fn text(meta_type: MetaType, text: &str) -> Result<Self, MessageError> {
        Self::new(meta_type, String::from(text).into_bytes())
    }

    pub const fn status(&self) -> u8 {
        Self::STATUS
    }

    pub const fn meta_type(&self) -> MetaType {
        self.meta_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Overwrite one payload byte. The payload length never changes.
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), MessageError> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(MessageError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    pub fn is_end_of_track(&self) -> bool {
        self.meta_type == MetaType::EndOfTrack
    }

    /// Decode the 3-byte big-endian tempo payload into microseconds per
    /// quarter note. The result does not depend on host byte order.
    pub fn tempo_value(&self) -> Result<u32, MessageError> {
        match (self.meta_type, self.data.as_slice()) {
            (MetaType::Tempo, &[hi, mid, lo]) => Ok(u32::from_be_bytes([0, hi, mid, lo])),
            _ => Err(MessageError::NotATempoMessage),
        }
    }
}
