//! Core IR types for amimus.
//!
//! This crate defines the packed MIDI message model used throughout the
//! converter. Format exporters emit these messages, the sequencing engine
//! orders them in time, and the file writer serializes them.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod error;
mod event;
mod message;
mod meta;
pub mod short;
mod sys_common;
mod sys_exclusive;
mod sys_realtime;

pub use channel::{ChannelCommand, ChannelMessage};
pub use error::MessageError;
pub use event::MidiEvent;
pub use message::MidiMessage;
pub use meta::{MetaMessage, MetaType};
pub use sys_common::{SysCommonMessage, SysCommonType};
pub use sys_exclusive::{SysExKind, SysExMessage};
pub use sys_realtime::{SysRealtimeMessage, SysRealtimeType};
