//! The seam between the coordinator and whatever actually makes sound.

use std::time::Duration;

use crate::error::AudioError;
use crate::library::MediaSource;

/// What the output learned while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadedMedia {
    /// `None` when the decoder cannot tell up front.
    pub duration: Option<Duration>,
}

/// A single-slot sound output. At most one resource is attached at a time;
/// `load` replaces nothing by itself, callers `unload` first.
///
/// A freshly loaded resource starts paused at position zero.
pub trait SoundOutput {
    fn load(&mut self, source: &MediaSource) -> Result<LoadedMedia, AudioError>;
    fn unload(&mut self) -> Result<(), AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn seek(&mut self, position: Duration) -> Result<(), AudioError>;

    /// Position within the loaded resource, zero when nothing is loaded.
    fn position(&self) -> Duration;

    /// The loaded resource ran out of samples.
    fn is_finished(&self) -> bool;

    /// Ramp volume down over `over`. Blocking; used on shutdown.
    fn fade_out(&mut self, _over: Duration) {}
}
