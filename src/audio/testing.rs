//! Test doubles shared by the audio and runtime tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::AudioError;
use crate::library::{MediaSource, Track};

use super::output::{LoadedMedia, SoundOutput};

/// Scripted output shared with the test through `Rc<RefCell<_>>`.
#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) loaded: Option<MediaSource>,
    pub(crate) paused: bool,
    pub(crate) position: Duration,
    pub(crate) finished: bool,
    pub(crate) calls: Vec<String>,
    pub(crate) fail_play: bool,
    pub(crate) fail_pause: bool,
    pub(crate) fail_seek: bool,
    pub(crate) fail_unload: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeOutput(pub(crate) Rc<RefCell<FakeState>>);

impl SoundOutput for FakeOutput {
    fn load(&mut self, source: &MediaSource) -> Result<LoadedMedia, AudioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(format!("load {source}"));
        if source.as_str().is_empty() || source.as_str().starts_with("missing") {
            return Err(AudioError::UnsupportedSource(source.to_string()));
        }
        s.loaded = Some(source.clone());
        s.paused = true;
        s.position = Duration::ZERO;
        s.finished = false;
        Ok(LoadedMedia { duration: None })
    }

    fn unload(&mut self) -> Result<(), AudioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push("unload".into());
        s.loaded = None;
        if s.fail_unload {
            return Err(AudioError::Device("unplugged".into()));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push("play".into());
        if s.fail_play {
            return Err(AudioError::Device("busy".into()));
        }
        if s.loaded.is_none() {
            return Err(AudioError::NotLoaded);
        }
        s.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push("pause".into());
        if s.fail_pause {
            return Err(AudioError::Device("busy".into()));
        }
        s.paused = true;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(format!("seek {}", position.as_millis()));
        if s.fail_seek {
            return Err(AudioError::Device("busy".into()));
        }
        s.position = position;
        s.finished = false;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.0.borrow().position
    }

    fn is_finished(&self) -> bool {
        self.0.borrow().finished
    }
}

pub(crate) fn track(id: &str, duration_ms: u64) -> Track {
    Track {
        id: id.into(),
        name: format!("Track {id}"),
        attribution: "Coach".into(),
        artwork: None,
        source: MediaSource::new(format!("/music/{id}.mp3")),
        duration_ms,
    }
}
