//! Validation errors for the message model.

use thiserror::Error;

use crate::meta::MetaType;

/// Error raised when a message is constructed or edited with invalid values.
///
/// Values are never clamped: every out-of-range input is reported here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MessageError {
    /// MIDI channel above 15
    #[error("MIDI channel out of range: {0}")]
    ChannelOutOfRange(u8),
    /// Data byte with the high bit set
    #[error("data byte out of range: {0}")]
    DataOutOfRange(u8),
    /// Status byte outside the channel message range 0x80..=0xEF
    #[error("status 0x{0:02X} is not a channel message")]
    NotAChannelMessage(u8),
    /// Status byte outside the system common table
    #[error("status 0x{0:02X} is not a system common message")]
    NotASysCommonMessage(u8),
    /// Status byte outside the system realtime table
    #[error("status 0x{0:02X} is not a system realtime message")]
    NotASysRealtimeMessage(u8),
    /// Status byte that does not start any packed message kind
    #[error("status 0x{0:02X} is not a short message")]
    NotAShortMessage(u8),
    /// Meta payload length rejected by the per-type length table
    #[error("length {length} out of range for {meta_type:?} meta message")]
    MetaLengthOutOfRange { meta_type: MetaType, length: usize },
    /// Tempo does not fit the 24-bit tempo payload
    #[error("tempo {0} us per quarter note does not fit in 24 bits")]
    TempoOutOfRange(u32),
    /// Tempo decode requested on another meta type
    #[error("message is not a tempo meta message")]
    NotATempoMessage,
    /// Byte index past the end of a variable-length payload
    #[error("index {index} out of range for payload of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
