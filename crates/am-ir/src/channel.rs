//! Channel voice messages.

use crate::error::MessageError;
use crate::short::{self, check_data};

/// Channel voice command, stored in the high nibble of the status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelCommand {
    NoteOff = 0x80,
    NoteOn = 0x90,
    PolyPressure = 0xA0,
    Controller = 0xB0,
    ProgramChange = 0xC0,
    ChannelPressure = 0xD0,
    PitchWheel = 0xE0,
}

impl ChannelCommand {
    /// Decode the command from a status byte already known to be a channel status.
    const fn from_channel_status(status: u8) -> Self {
        match status & 0xF0 {
            0x80 => ChannelCommand::NoteOff,
            0x90 => ChannelCommand::NoteOn,
            0xA0 => ChannelCommand::PolyPressure,
            0xB0 => ChannelCommand::Controller,
            0xC0 => ChannelCommand::ProgramChange,
            0xD0 => ChannelCommand::ChannelPressure,
            _ => ChannelCommand::PitchWheel,
        }
    }

    /// Number of data bytes that follow the status byte on the wire.
    pub const fn data_len(self) -> usize {
        match self {
            ChannelCommand::ProgramChange | ChannelCommand::ChannelPressure => 1,
            _ => 2,
        }
    }
}

/// A channel voice message packed into a single integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelMessage {
    packed: u32,
}

impl ChannelMessage {
    /// Highest MIDI channel number (channels are 0-based).
    pub const CHANNEL_MAX: u8 = 15;

    /// Build a message, validating every field.
    pub fn new(
        command: ChannelCommand,
        channel: u8,
        data1: u8,
        data2: u8,
    ) -> Result<Self, MessageError> {
        if channel > Self::CHANNEL_MAX {
            return Err(MessageError::ChannelOutOfRange(channel));
        }
        let status = command as u8 | channel;
        Ok(Self {
            packed: short::pack(status, check_data(data1)?, check_data(data2)?),
        })
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Result<Self, MessageError> {
        Self::new(ChannelCommand::NoteOn, channel, note, velocity)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Result<Self, MessageError> {
        Self::new(ChannelCommand::NoteOff, channel, note, velocity)
    }

    pub fn program_change(channel: u8, program: u8) -> Result<Self, MessageError> {
        Self::new(ChannelCommand::ProgramChange, channel, program, 0)
    }

    /// Rebuild a message from its packed form.
    ///
    /// Fails if the status byte is outside `0x80..=0xEF` or a data byte has
    /// its high bit set.
    pub fn from_packed(packed: u32) -> Result<Self, MessageError> {
        let status = short::unpack_status(packed);
        if !Self::is_channel_status(status) {
            return Err(MessageError::NotAChannelMessage(status));
        }
        let data1 = check_data(short::unpack_data1(packed))?;
        let data2 = check_data(short::unpack_data2(packed))?;
        Ok(Self {
            packed: short::pack(status, data1, data2),
        })
    }

    /// Returns true if `status` belongs to a channel voice message.
    pub const fn is_channel_status(status: u8) -> bool {
        status >= ChannelCommand::NoteOff as u8
            && status <= ChannelCommand::PitchWheel as u8 + Self::CHANNEL_MAX
    }

    pub const fn packed(&self) -> u32 {
        self.packed
    }

    pub const fn status(&self) -> u8 {
        short::unpack_status(self.packed)
    }

    pub const fn command(&self) -> ChannelCommand {
        ChannelCommand::from_channel_status(self.status())
    }

    pub const fn channel(&self) -> u8 {
        self.status() & 0x0F
    }

    pub const fn data1(&self) -> u8 {
        short::unpack_data1(self.packed)
    }

    pub const fn data2(&self) -> u8 {
        short::unpack_data2(self.packed)
    }

    pub fn set_command(&mut self, command: ChannelCommand) {
        self.packed = short::with_status(self.packed, command as u8 | self.channel());
    }

    pub fn set_channel(&mut self, channel: u8) -> Result<(), MessageError> {
        if channel > Self::CHANNEL_MAX {
            return Err(MessageError::ChannelOutOfRange(channel));
        }
        self.packed = short::with_status(self.packed, self.command() as u8 | channel);
        Ok(())
    }

    pub fn set_data1(&mut self, value: u8) -> Result<(), MessageError> {
        self.packed = short::with_data1(self.packed, check_data(value)?);
        Ok(())
    }

    pub fn set_data2(&mut self, value: u8) -> Result<(), MessageError> {
        self.packed = short::with_data2(self.packed, check_data(value)?);
        Ok(())
    }
}
