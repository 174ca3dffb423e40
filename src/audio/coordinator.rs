//! Queue-aware transport over a single sound output.
//!
//! The coordinator owns the output, the queue and the observable snapshot.
//! Every failure of the output is logged and folded into the snapshot; no
//! public method returns an error.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::error::AudioError;
use crate::library::Track;

use super::output::SoundOutput;
use super::queue::Queue;
use super::types::{PlaybackState, StatusEvent, SubscriptionId};

type Callback = Box<dyn FnMut(&PlaybackState)>;

pub struct PlaybackCoordinator<O: SoundOutput> {
    output: O,
    queue: Queue,
    state: PlaybackState,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: u64,
    looping: bool,
    restart_threshold_ms: u64,
}

impl<O: SoundOutput> PlaybackCoordinator<O> {
    pub fn new(output: O, settings: &AudioSettings) -> Self {
        Self {
            output,
            queue: Queue::default(),
            state: PlaybackState::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
            looping: false,
            restart_threshold_ms: settings.restart_threshold_ms,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// When on, a track that ends naturally restarts instead of advancing.
    pub fn set_looping(&mut self, on: bool) {
        self.looping = on;
    }

    /// Register `callback`. It runs once right away with the current snapshot,
    /// then after every change, in registration order.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let mut callback: Callback = Box::new(callback);
        callback(&self.state);
        self.subscribers.push((id, callback));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.state);
        }
    }

    /// Detach whatever the output holds. Errors are logged only.
    fn release(&mut self) {
        if let Err(e) = self.output.unload() {
            warn!(error = %e, "failed to unload previous track");
        }
    }

    fn reset_idle(&mut self) {
        self.state = PlaybackState::default();
        self.notify();
    }

    fn transport_failed(&mut self, op: &'static str, e: AudioError) {
        error!(op, error = %e, "transport command failed");
        self.state.is_playing = false;
        self.state.is_buffering = false;
        self.notify();
    }

    /// Unload the current track, then load and start `track`.
    ///
    /// Returns false when the track could not be loaded or started; the
    /// coordinator is then idle.
    pub fn load_and_play(&mut self, track: &Track) -> bool {
        self.release();
        self.state = PlaybackState {
            is_buffering: true,
            duration_ms: track.duration_ms,
            current_track: Some(track.clone()),
            ..PlaybackState::default()
        };
        self.notify();

        let media = match self.output.load(&track.source) {
            Ok(media) => media,
            Err(e) => {
                error!(track = %track.id, error = %e, "failed to load track");
                self.reset_idle();
                return false;
            }
        };

        if let Err(e) = self.output.play() {
            error!(track = %track.id, error = %e, "failed to start track");
            self.release();
            self.reset_idle();
            return false;
        }

        let reported_ms = media.duration.map_or(0, |d| d.as_millis() as u64);
        self.state.is_loaded = true;
        self.state.is_buffering = false;
        self.state.is_playing = true;
        if reported_ms > 0 {
            self.state.duration_ms = reported_ms;
        }
        info!(track = %track.id, duration_ms = self.state.duration_ms, "playing");
        self.notify();
        true
    }

    pub fn toggle_play_pause(&mut self) {
        if !self.state.is_loaded {
            return;
        }
        if self.state.is_playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn pause(&mut self) {
        if !self.state.is_loaded {
            return;
        }
        match self.output.pause() {
            Ok(()) => {
                self.state.is_playing = false;
                self.notify();
            }
            Err(e) => self.transport_failed("pause", e),
        }
    }

    pub fn resume(&mut self) {
        if !self.state.is_loaded {
            return;
        }
        match self.output.play() {
            Ok(()) => {
                self.state.is_playing = true;
                self.notify();
            }
            Err(e) => self.transport_failed("resume", e),
        }
    }

    /// Jump to `position_ms`, clamped to the known duration.
    pub fn seek_to(&mut self, position_ms: u64) {
        if !self.state.is_loaded {
            return;
        }
        let target = match self.state.duration_ms {
            0 => position_ms,
            d => position_ms.min(d),
        };
        match self.output.seek(Duration::from_millis(target)) {
            Ok(()) => {
                self.state.position_ms = target;
                self.notify();
            }
            Err(e) => self.transport_failed("seek", e),
        }
    }

    /// Replace the queue and cursor. Playback is not touched.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.queue.replace(tracks, start_index);
        debug!(len = self.queue.len(), cursor = ?self.queue.cursor(), "queue replaced");
    }

    /// Play the queue entry at `index`. Out of range does nothing.
    pub fn play_from_queue(&mut self, index: usize) -> bool {
        let Some(track) = self.queue.select(index) else {
            debug!(index, len = self.queue.len(), "queue index out of range");
            return false;
        };
        self.load_and_play(&track)
    }

    /// Advance to the next entry, or stop when the queue is exhausted.
    pub fn play_next(&mut self) -> bool {
        match self.queue.next_index() {
            Some(i) => self.play_from_queue(i),
            None => {
                info!("queue exhausted");
                self.stop();
                false
            }
        }
    }

    /// Restart the current track once past the restart threshold, otherwise
    /// step back one entry (restarting when already at the first).
    pub fn play_previous(&mut self) {
        if self.state.position_ms > self.restart_threshold_ms {
            self.seek_to(0);
            return;
        }
        match self.queue.previous_index() {
            Some(i) => {
                self.play_from_queue(i);
            }
            None => self.seek_to(0),
        }
    }

    /// Unload and reset the snapshot. The queue and cursor are kept.
    pub fn stop(&mut self) {
        self.release();
        self.reset_idle();
    }

    /// Fold a status report from the output into the snapshot.
    pub fn handle_status(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::Loaded { duration_ms } => {
                self.state.is_loaded = true;
                if duration_ms > 0 {
                    self.state.duration_ms = duration_ms;
                }
            }
            StatusEvent::Playing => {
                self.state.is_playing = true;
                self.state.is_buffering = false;
            }
            StatusEvent::Paused => self.state.is_playing = false,
            StatusEvent::Buffering(on) => self.state.is_buffering = on,
            StatusEvent::Position(ms) => self.state.position_ms = ms,
            StatusEvent::Error(msg) => {
                error!(error = %msg, "output reported an error");
                self.state.is_playing = false;
                self.state.is_buffering = false;
            }
            StatusEvent::Finished => {
                self.finished();
                return;
            }
        }
        self.notify();
    }

    fn finished(&mut self) {
        if !self.state.is_loaded {
            return;
        }
        if self.looping {
            debug!("looping current track");
            self.seek_to(0);
            self.resume();
        } else {
            self.state.position_ms = self.state.duration_ms;
            self.play_next();
        }
    }

    /// Poll the output for progress and natural completion.
    pub fn tick(&mut self) {
        if !self.state.is_loaded || self.state.is_buffering {
            return;
        }
        if self.state.is_playing && self.output.is_finished() {
            self.handle_status(StatusEvent::Finished);
            return;
        }
        let position_ms = self.output.position().as_millis() as u64;
        if position_ms != self.state.position_ms {
            self.handle_status(StatusEvent::Position(position_ms));
        }
    }

    /// Fade out, stop and drop all subscribers.
    pub fn dispose(mut self, fade_out: Duration) {
        if self.state.is_playing {
            self.output.fade_out(fade_out);
        }
        self.stop();
        self.subscribers.clear();
        info!("playback coordinator disposed");
    }
}
