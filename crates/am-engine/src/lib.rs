//! Sequencing engine for amimus.
//!
//! Holds tick-relative event tracks, merges them into a single timeline and
//! caches the merged result per sequence.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod sequence;
mod track;

pub use sequence::Sequence;
pub use track::{Track, TrackError};
