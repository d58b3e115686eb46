//! System exclusive messages.

use alloc::vec::Vec;

use crate::error::MessageError;

/// Whether a system exclusive message opens a dump or continues/escapes one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SysExKind {
    Start = 0xF0,
    Continuation = 0xF7,
}

/// A system exclusive message.
///
/// For [`SysExKind::Start`] the stored buffer begins with the 0xF0 status
/// byte; indexing skips it so index 0 is always the first payload byte.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SysExMessage {
    kind: SysExKind,
    message: Vec<u8>,
}

impl SysExMessage {
    pub fn new(kind: SysExKind, data: &[u8]) -> Self {
        let mut message = Vec::with_capacity(data.len() + 1);
        if kind == SysExKind::Start {
            message.push(SysExKind::Start as u8);
        }
        message.extend_from_slice(data);
        Self { kind, message }
    }

    pub const fn is_sys_ex_status(status: u8) -> bool {
        status == SysExKind::Start as u8 || status == SysExKind::Continuation as u8
    }

    pub const fn kind(&self) -> SysExKind {
        self.kind
    }

    pub const fn status(&self) -> u8 {
        self.kind as u8
    }

    fn header_len(&self) -> usize {
        match self.kind {
            SysExKind::Start => 1,
            SysExKind::Continuation => 0,
        }
    }

    /// Payload bytes, excluding the leading status byte of a start message.
    pub fn data(&self) -> &[u8] {
        &self.message[self.header_len()..]
    }

    /// The stored buffer, including the status byte of a start message.
    pub fn raw(&self) -> &[u8] {
        &self.message
    }

    pub fn len(&self) -> usize {
        self.message.len() - self.header_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.data().get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: u8) -> Result<(), MessageError> {
        let len = self.len();
        if index >= len {
            return Err(MessageError::IndexOutOfRange { index, len });
        }
        let offset = self.header_len();
        self.message[index + offset] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_message_hides_status_byte() {
        let msg = SysExMessage::new(SysExKind::Start, &[0x43, 0x12, 0xF7]);
        assert_eq!(msg.raw(), &[0xF0, 0x43, 0x12, 0xF7]);
        assert_eq!(msg.len(), 3);
        assert_eq!(msg.get(0), Some(0x43));
        assert_eq!(msg.get(3), None);
        assert_eq!(msg.status(), 0xF0);
    }

    #[test]
    fn continuation_indexes_from_zero() {
        let mut msg = SysExMessage::new(SysExKind::Continuation, &[0x01, 0x02]);
        assert_eq!(msg.raw(), msg.data());
        assert_eq!(msg.get(0), Some(0x01));
        msg.set(1, 0x7E).unwrap();
        assert_eq!(msg.data(), &[0x01, 0x7E]);
        assert_eq!(
            msg.set(2, 0),
            Err(MessageError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn empty_start_message() {
        let msg = SysExMessage::new(SysExKind::Start, &[]);
        assert!(msg.is_empty());
        assert_eq!(msg.raw(), &[0xF0]);
    }
}
