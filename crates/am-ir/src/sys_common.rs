//! System common messages.

use crate::error::MessageError;
use crate::short::{self, check_data};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SysCommonType {
    MidiTimeCode = 0xF1,
    SongPositionPointer = 0xF2,
    SongSelect = 0xF3,
    TuneRequest = 0xF6,
}

impl SysCommonType {
    pub const fn from_status(status: u8) -> Option<Self> {
        match status {
            0xF1 => Some(SysCommonType::MidiTimeCode),
            0xF2 => Some(SysCommonType::SongPositionPointer),
            0xF3 => Some(SysCommonType::SongSelect),
            0xF6 => Some(SysCommonType::TuneRequest),
            _ => None,
        }
    }

    /// Number of data bytes that follow the status byte on the wire.
    pub const fn data_len(self) -> usize {
        match self {
            SysCommonType::MidiTimeCode | SysCommonType::SongSelect => 1,
            SysCommonType::SongPositionPointer => 2,
            SysCommonType::TuneRequest => 0,
        }
    }
}

/// A system common message packed into a single integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SysCommonMessage {
    kind: SysCommonType,
    packed: u32,
}

impl SysCommonMessage {
    pub fn new(kind: SysCommonType, data1: u8, data2: u8) -> Result<Self, MessageError> {
        Ok(Self {
            kind,
            packed: short::pack(kind as u8, check_data(data1)?, check_data(data2)?),
        })
    }

    pub fn from_packed(packed: u32) -> Result<Self, MessageError> {
        let status = short::unpack_status(packed);
        let kind =
            SysCommonType::from_status(status).ok_or(MessageError::NotASysCommonMessage(status))?;
        Self::new(kind, short::unpack_data1(packed), short::unpack_data2(packed))
    }

    pub const fn is_sys_common_status(status: u8) -> bool {
        SysCommonType::from_status(status).is_some()
    }

    pub const fn kind(&self) -> SysCommonType {
        self.kind
    }

    pub const fn packed(&self) -> u32 {
        self.packed
    }

    pub const fn status(&self) -> u8 {
        self.kind as u8
    }

    pub const fn data1(&self) -> u8 {
        short::unpack_data1(self.packed)
    }

    pub const fn data2(&self) -> u8 {
        short::unpack_data2(self.packed)
    }
}
