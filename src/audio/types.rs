//! Audio-related small types.
//!
//! This module defines the observable playback snapshot, the status events
//! an output reports, and the handle returned by `subscribe`.

use crate::library::Track;

/// Observable snapshot of playback, pushed to subscribers on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Whether audio is currently audible (loaded and not paused).
    pub is_playing: bool,
    /// A load is in flight.
    pub is_buffering: bool,
    /// A sound resource is attached to the output.
    pub is_loaded: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub current_track: Option<Track>,
}

impl PlaybackState {
    /// Coarse state-machine view of the snapshot.
    pub fn phase(&self) -> Phase {
        if self.is_buffering {
            Phase::Loading
        } else if !self.is_loaded {
            Phase::Idle
        } else if self.is_playing {
            Phase::Playing
        } else {
            Phase::Paused
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Something the output reported about the loaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Media attached; `duration_ms` is 0 when the output cannot tell.
    Loaded { duration_ms: u64 },
    Playing,
    Paused,
    Buffering(bool),
    /// Periodic position tick.
    Position(u64),
    Error(String),
    /// The track played to its natural end.
    Finished,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);
