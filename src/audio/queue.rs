//! The play queue and its cursor.

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::library::Track;

/// Ordered tracks plus a cursor. `cursor` is `None` when nothing is selected.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
}

impl Queue {
    /// Replace tracks and cursor wholesale. A `start` past the end leaves the
    /// cursor unset.
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize) {
        self.cursor = (start < tracks.len()).then_some(start);
        self.tracks = tracks;
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

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Move the cursor to `index` and return that track; out of range leaves
    /// the cursor alone.
    pub fn select(&mut self, index: usize) -> Option<Track> {
        let track = self.tracks.get(index)?.clone();
        self.cursor = Some(index);
        Some(track)
    }

    /// Index after the cursor, or the first entry when the cursor is unset.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.cursor.map_or(0, |c| c + 1);
        (next < self.tracks.len()).then_some(next)
    }

    /// Index before the cursor, `None` at the first entry or when unset.
    pub fn previous_index(&self) -> Option<usize> {
        self.cursor.and_then(|c| c.checked_sub(1))
    }
}

/// Shuffle `tracks` in place.
pub(crate) fn shuffle_tracks(tracks: &mut [Track]) {
    tracks.shuffle(&mut thread_rng());
}
