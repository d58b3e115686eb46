//! Collections of tracks sharing one timing resolution.

use alloc::vec::Vec;

use crate::track::Track;

/// A set of tracks plus a lazily merged view of them.
///
/// The merged track is rebuilt on read when a track was added or removed, or
/// when any member's revision moved since the last rebuild.
#[derive(Clone, Debug)]
pub struct Sequence {
    division: u16,
    tracks: Vec<Track>,
    /// Member revisions observed at the last rebuild, in track order.
    revisions: Vec<u64>,
    merged: Track,
    dirty: bool,
}

impl Sequence {
    /// Create an empty sequence. `division` is ticks per quarter note, or an
    /// SMPTE resolution when its high byte is negative.
    pub fn new(division: u16) -> Self {
        Self {
            division,
            tracks: Vec::new(),
            revisions: Vec::new(),
            merged: Track::new(),
            dirty: true,
        }
    }

    pub fn division(&self) -> u16 {
        self.division
    }

    /// True if the division encodes SMPTE frames rather than pulses per quarter.
    pub fn is_smpte(&self) -> bool {
        ((self.division >> 8) as u8 as i8) < 0
    }

    /// Append a track and return its index.
    pub fn add(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.dirty = true;
        self.tracks.len() - 1
    }

    /// Remove and return the track at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.dirty = true;
        Some(self.tracks.remove(index))
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Mutable access to a member track. The merged track is rebuilt on the
    /// next read even if the track is replaced wholesale.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        let track = self.tracks.get_mut(index)?;
        self.dirty = true;
        Some(track)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Length in ticks of the longest track, ignoring mute and solo.
    pub fn length(&self) -> u64 {
        self.tracks.iter().map(Track::length).max().unwrap_or(0)
    }

    fn is_dirty(&self) -> bool {
        self.dirty
            || self.revisions.len() != self.tracks.len()
            || self
                .tracks
                .iter()
                .zip(&self.revisions)
                .any(|(track, &seen)| track.revision() != seen)
    }

    /// All selected tracks merged into one.
    ///
    /// When any track is soloed only soloed, unmuted tracks take part;
    /// otherwise every unmuted track does. Tracks are folded in insertion
    /// order starting from an empty track.
    pub fn merged_track(&mut self) -> &Track {
        if self.is_dirty() {
            let any_solo = self.tracks.iter().any(Track::solo);
            let selected = |track: &&Track| !track.mute() && (!any_solo || track.solo());

            let mut merged = Track::new();
            let mut count = 0;
            for track in self.tracks.iter().filter(selected) {
                merged = Track::merge(&merged, track);
                count += 1;
            }
            log::debug!(
                "merged {count} of {} tracks into {} events",
                self.tracks.len(),
                merged.len()
            );

            self.merged = merged;
            self.revisions = self.tracks.iter().map(Track::revision).collect();
            self.dirty = false;
        }
        &self.merged
    }
}
