//! Time-stamped messages.

use crate::message::MidiMessage;

/// A message placed on a track.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MidiEvent {
    /// The message to emit
    pub message: MidiMessage,
    /// Ticks since the previous event on the same track
    pub ticks: u32,
}

impl MidiEvent {
    /// Create a new event.
    pub fn new(message: impl Into<MidiMessage>, ticks: u32) -> Self {
        Self {
            message: message.into(),
            ticks,
        }
    }

    /// An end-of-track marker after `ticks` of silence.
    pub fn end_of_track(ticks: u32) -> Self {
        Self::new(crate::MetaMessage::end_of_track(), ticks)
    }
}
