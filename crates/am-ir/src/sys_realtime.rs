//! System realtime messages. These carry no data bytes.

use crate::error::MessageError;
use crate::short;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SysRealtimeType {
    Clock = 0xF8,
    Tick = 0xF9,
    Start = 0xFA,
    Continue = 0xFB,
    Stop = 0xFC,
    ActiveSense = 0xFE,
    Reset = 0xFF,
}

impl SysRealtimeType {
    pub const fn from_status(status: u8) -> Option<Self> {
        match status {
            0xF8 => Some(SysRealtimeType::Clock),
            0xF9 => Some(SysRealtimeType::Tick),
            0xFA => Some(SysRealtimeType::Start),
            0xFB => Some(SysRealtimeType::Continue),
            0xFC => Some(SysRealtimeType::Stop),
            0xFE => Some(SysRealtimeType::ActiveSense),
            0xFF => Some(SysRealtimeType::Reset),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SysRealtimeMessage {
    kind: SysRealtimeType,
}

impl SysRealtimeMessage {
    pub const fn new(kind: SysRealtimeType) -> Self {
        Self { kind }
    }

    /// Rebuild from a packed integer; only the status byte is significant.
    pub fn from_packed(packed: u32) -> Result<Self, MessageError> {
        let status = short::unpack_status(packed);
        SysRealtimeType::from_status(status)
            .map(Self::new)
            .ok_or(MessageError::NotASysRealtimeMessage(status))
    }

    pub const fn is_sys_realtime_status(status: u8) -> bool {
        SysRealtimeType::from_status(status).is_some()
    }

    pub const fn kind(&self) -> SysRealtimeType {
        self.kind
    }

    pub const fn packed(&self) -> u32 {
        self.kind as u32
    }

    pub const fn status(&self) -> u8 {
        self.kind as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        for status in 0..=0xFFu8 {
            let expected = matches!(status, 0xF8..=0xFC | 0xFE | 0xFF);
            assert_eq!(SysRealtimeMessage::is_sys_realtime_status(status), expected);
        }
    }

    #[test]
    fn from_packed() {
        let msg = SysRealtimeMessage::from_packed(0xFA).unwrap();
        assert_eq!(msg.kind(), SysRealtimeType::Start);
        assert_eq!(msg.packed(), 0xFA);
        assert_eq!(
            SysRealtimeMessage::from_packed(0xFD),
            Err(MessageError::NotASysRealtimeMessage(0xFD))
        );
    }
}
