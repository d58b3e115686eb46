//! The closed set of MIDI message kinds.

use crate::channel::ChannelMessage;
use crate::error::MessageError;
use crate::meta::MetaMessage;
use crate::short;
use crate::sys_common::SysCommonMessage;
use crate::sys_exclusive::SysExMessage;
use crate::sys_realtime::SysRealtimeMessage;

/// Any message that can sit in a track.
///
/// Consumers match exhaustively, so adding a kind is a compile error at
/// every site that must learn about it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    Channel(ChannelMessage),
    Meta(MetaMessage),
    SysCommon(SysCommonMessage),
    SysExclusive(SysExMessage),
    SysRealtime(SysRealtimeMessage),
}

impl MidiMessage {
    /// Decode a packed short message, picking the kind from its status byte.
    pub fn from_packed(packed: u32) -> Result<Self, MessageError> {
        let status = short::unpack_status(packed);
        if ChannelMessage::is_channel_status(status) {
            ChannelMessage::from_packed(packed).map(MidiMessage::Channel)
        } else if SysCommonMessage::is_sys_common_status(status) {
            SysCommonMessage::from_packed(packed).map(MidiMessage::SysCommon)
        } else if SysRealtimeMessage::is_sys_realtime_status(status) {
            SysRealtimeMessage::from_packed(packed).map(MidiMessage::SysRealtime)
        } else {
            Err(MessageError::NotAShortMessage(status))
        }
    }

    pub fn status(&self) -> u8 {
        match self {
            MidiMessage::Channel(msg) => msg.status(),
            MidiMessage::Meta(msg) => msg.status(),
            MidiMessage::SysCommon(msg) => msg.status(),
            MidiMessage::SysExclusive(msg) => msg.status(),
            MidiMessage::SysRealtime(msg) => msg.status(),
        }
    }

    pub fn as_channel(&self) -> Option<&ChannelMessage> {
        match self {
            MidiMessage::Channel(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&MetaMessage> {
        match self {
            MidiMessage::Meta(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self, MidiMessage::Meta(meta) if meta.is_end_of_track())
    }
}

impl From<ChannelMessage> for MidiMessage {
    fn from(msg: ChannelMessage) -> Self {
        MidiMessage::Channel(msg)
    }
}

impl From<MetaMessage> for MidiMessage {
    fn from(msg: MetaMessage) -> Self {
        MidiMessage::Meta(msg)
    }
}

impl From<SysCommonMessage> for MidiMessage {
    fn from(msg: SysCommonMessage) -> Self {
        MidiMessage::SysCommon(msg)
    }
}

impl From<SysExMessage> for MidiMessage {
    fn from(msg: SysExMessage) -> Self {
        MidiMessage::SysExclusive(msg)
    }
}

impl From<SysRealtimeMessage> for MidiMessage {
    fn from(msg: SysRealtimeMessage) -> Self {
        MidiMessage::SysRealtime(msg)
    }
}
