//! Queue order, cursor and position carried across runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::{PlaybackCoordinator, SoundOutput};
use crate::library::Track;
use crate::store::{self, KeyValueStore, keys};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub track_ids: Vec<String>,
    pub cursor: Option<usize>,
    pub position_ms: u64,
}

/// A seek owed to the queue entry at `index` the first time it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSeek {
    pub index: usize,
    pub position_ms: u64,
}

#[derive(Debug)]
pub struct Restored {
    pub tracks: Vec<Track>,
    pub cursor: usize,
    pub seek: Option<PendingSeek>,
}

impl QueueSnapshot {
    pub fn capture<O: SoundOutput>(coordinator: &PlaybackCoordinator<O>) -> Self {
        let queue = coordinator.queue();
        let state = coordinator.state();
        Self {
            track_ids: queue.tracks().iter().map(|t| t.id.clone()).collect(),
            cursor: queue.cursor(),
            position_ms: if state.is_loaded { state.position_ms } else { 0 },
        }
    }

    /// Put `library` back into the saved order. Tracks that disappeared are
    /// dropped; tracks the snapshot never saw go last, in library order.
    pub fn restore(&self, library: Vec<Track>) -> Restored {
        let mut remaining: Vec<Option<Track>> = library.into_iter().map(Some).collect();
        let by_id: HashMap<String, usize> = remaining
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (t.id.clone(), i)))
            .collect();

        let mut tracks = Vec::with_capacity(remaining.len());
        for id in &self.track_ids {
            if let Some(t) = by_id.get(id).and_then(|&i| remaining[i].take()) {
                tracks.push(t);
            }
        }
        tracks.extend(remaining.into_iter().flatten());

        let current = self
            .cursor
            .and_then(|c| self.track_ids.get(c))
            .and_then(|id| tracks.iter().position(|t| &t.id == id));

        match current {
            Some(index) => Restored {
                tracks,
                cursor: index,
                seek: (self.position_ms > 0).then_some(PendingSeek {
                    index,
                    position_ms: self.position_ms,
                }),
            },
            None => Restored {
                tracks,
                cursor: 0,
                seek: None,
            },
        }
    }
}

/// Read the saved snapshot. An unreadable one is logged and ignored.
pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Option<QueueSnapshot> {
    match store::get_json(store, keys::PLAYBACK) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable playback snapshot");
            None
        }
    }
}

pub fn save<O: SoundOutput, S: KeyValueStore + ?Sized>(
    coordinator: &PlaybackCoordinator<O>,
    store: &mut S,
) {
    let snapshot = QueueSnapshot::capture(coordinator);
    match store::set_json(store, keys::PLAYBACK, &snapshot) {
        Ok(()) => debug!(
            tracks = snapshot.track_ids.len(),
            cursor = ?snapshot.cursor,
            position_ms = snapshot.position_ms,
            "playback snapshot saved"
        ),
        Err(e) => warn!(error = %e, "failed to save playback snapshot"),
    }
}

/// Apply `pending` once its entry is the loaded one.
pub fn apply_pending_seek<O: SoundOutput>(
    coordinator: &mut PlaybackCoordinator<O>,
    pending: &mut Option<PendingSeek>,
) {
    let Some(seek) = *pending else {
        return;
    };
    if coordinator.state().is_loaded && coordinator.queue().cursor() == Some(seek.index) {
        debug!(position_ms = seek.position_ms, "resuming saved position");
        coordinator.seek_to(seek.position_ms);
        *pending = None;
    }
}
