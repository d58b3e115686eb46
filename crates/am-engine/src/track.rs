//! Ordered lists of tick-relative events.

use alloc::vec::Vec;
use am_ir::MidiEvent;
use thiserror::Error;

/// Error raised by positional track edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("index {index} out of range for track of {len} events")]
    IndexOutOfRange { index: usize, len: usize },
    /// The slide would move the event before its predecessor or past `u32::MAX` ticks.
    #[error("slide by {amount} out of range for event with {ticks} ticks")]
    SlideOutOfRange { ticks: u32, amount: i64 },
}

/// A list of events, each timed relative to the one before it.
///
/// Every edit (including mute and solo changes) bumps `revision`, which is
/// how an owning [`Sequence`](crate::Sequence) notices its merged cache is stale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<MidiEvent>,
    mute: bool,
    solo: bool,
    revision: u64,
}

impl Track {
    /// Create a new empty track.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn check_index(&self, index: usize) -> Result<(), TrackError> {
        if index >= self.events.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.events.len(),
            });
        }
        Ok(())
    }

    /// Append an event to the end of the track.
    pub fn push(&mut self, event: MidiEvent) {
        self.events.push(event);
        self.touch();
    }

    /// Insert an event before `index`. `index == len()` appends.
    pub fn insert(&mut self, index: usize, event: MidiEvent) -> Result<(), TrackError> {
        if index > self.events.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.events.len(),
            });
        }
        self.events.insert(index, event);
        self.touch();
        Ok(())
    }

    /// Remove and return the event at `index`.
    pub fn remove(&mut self, index: usize) -> Result<MidiEvent, TrackError> {
        self.check_index(index)?;
        let event = self.events.remove(index);
        self.touch();
        Ok(event)
    }

    /// Remove the first event equal to `event`. Returns whether one was found.
    pub fn remove_event(&mut self, event: &MidiEvent) -> bool {
        let found = self.events.iter().position(|e| e == event);
        if let Some(index) = found {
            self.events.remove(index);
        }
        self.touch();
        found.is_some()
    }

    /// Replace the event at `index`, returning the old one.
    pub fn set(&mut self, index: usize, event: MidiEvent) -> Result<MidiEvent, TrackError> {
        self.check_index(index)?;
        let old = core::mem::replace(&mut self.events[index], event);
        self.touch();
        Ok(old)
    }

    /// Move the event at `index` forwards (positive) or backwards (negative)
    /// in time by adjusting its delta. Later events move with it.
    pub fn slide(&mut self, index: usize, amount: i64) -> Result<(), TrackError> {
        self.check_index(index)?;
        let ticks = self.events[index].ticks;
        let moved = i64::from(ticks) + amount;
        let moved =
            u32::try_from(moved).map_err(|_| TrackError::SlideOutOfRange { ticks, amount })?;
        self.events[index].ticks = moved;
        self.touch();
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&MidiEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn iter(&self) -> core::slice::Iter<'_, MidiEvent> {
        self.events.iter()
    }

    /// Total length in ticks: the sum of every event's delta.
    pub fn length(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.ticks)).sum()
    }

    pub fn mute(&self) -> bool {
        self.mute
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
        self.touch();
    }

    pub fn solo(&self) -> bool {
        self.solo
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
        self.touch();
    }

    /// Change counter, bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Interleave two tracks by absolute time.
    ///
    /// Each output delta stays relative to the previous output event. On a
    /// tie the event from `a` goes first. The last event of each input is
    /// treated as its end-of-track marker and is never consumed while
    /// interleaving: once one input is down to its marker, the remaining
    /// events of the other input (marker included) are appended as-is and
    /// the exhausted input's marker is dropped.
    ///
    /// The inputs are not modified. Mute and solo flags are not carried over.
    pub fn merge(a: &Track, b: &Track) -> Track {
        let mut a = a.events.clone();
        let mut b = b.events.clone();
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);

        while i + 1 < a.len() && j + 1 < b.len() {
            while i + 1 < a.len() && a[i].ticks <= b[j].ticks {
                b[j].ticks -= a[i].ticks;
                merged.push(a[i].clone());
                i += 1;
            }

            if i + 1 < a.len() {
                while j + 1 < b.len() && b[j].ticks < a[i].ticks {
                    a[i].ticks -= b[j].ticks;
                    merged.push(b[j].clone());
                    j += 1;
                }
            }
        }

        if i + 1 < a.len() {
            merged.extend(a.drain(i..));
        } else if j + 1 < b.len() {
            merged.extend(b.drain(j..));
        }

        Track {
            events: merged,
            ..Track::default()
        }
    }
}

impl FromIterator<MidiEvent> for Track {
    fn from_iter<I: IntoIterator<Item = MidiEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a MidiEvent;
    type IntoIter = core::slice::Iter<'a, MidiEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
