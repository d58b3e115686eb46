//! Bit packing shared by the short (packed-integer) message kinds.
//!
//! A short message is stored in one `u32`:
//! bits 0..8 hold the status byte, bits 8..16 the first data byte and
//! bits 16..24 the second data byte. Data bytes never set their high bit.

use crate::error::MessageError;

/// Largest legal data byte.
pub const DATA_MAX: u8 = 127;

const DATA1_SHIFT: u32 = 8;
const DATA2_SHIFT: u32 = 16;

/// Pack a status byte and two data bytes.
pub const fn pack(status: u8, data1: u8, data2: u8) -> u32 {
    status as u32 | (data1 as u32) << DATA1_SHIFT | (data2 as u32) << DATA2_SHIFT
}

pub const fn unpack_status(packed: u32) -> u8 {
    (packed & 0xFF) as u8
}

pub const fn unpack_data1(packed: u32) -> u8 {
    ((packed >> DATA1_SHIFT) & 0xFF) as u8
}

pub const fn unpack_data2(packed: u32) -> u8 {
    ((packed >> DATA2_SHIFT) & 0xFF) as u8
}

/// Replace the first data byte of a packed message.
pub(crate) const fn with_data1(packed: u32, data1: u8) -> u32 {
    (packed & !(0xFF << DATA1_SHIFT)) | (data1 as u32) << DATA1_SHIFT
}

/// Replace the second data byte of a packed message.
pub(crate) const fn with_data2(packed: u32, data2: u8) -> u32 {
    (packed & !(0xFF << DATA2_SHIFT)) | (data2 as u32) << DATA2_SHIFT
}

/// Replace the status byte of a packed message.
pub(crate) const fn with_status(packed: u32, status: u8) -> u32 {
    (packed & !0xFF) | status as u32
}

/// Reject data bytes with the high bit set.
pub(crate) fn check_data(value: u8) -> Result<u8, MessageError> {
    if value > DATA_MAX {
        return Err(MessageError::DataOutOfRange(value));
    }
    Ok(value)
}
