//! `SoundOutput` backed by a `rodio` output stream.
//!
//! Each load opens and decodes the file into a fresh paused `Sink`. Seeking
//! rebuilds the sink and skips into the file, which works for every format
//! the decoder understands.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::error::AudioError;
use crate::library::MediaSource;

use super::output::{LoadedMedia, SoundOutput};

pub struct RodioOutput {
    stream: OutputStream,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    /// Where the current sink started inside the file.
    offset: Duration,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn open() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which garbles a raw-mode terminal.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            sink: None,
            path: None,
            offset: Duration::ZERO,
        })
    }
}

/// Create a paused `Sink` for the file at `path` that starts playback at `start_at`.
fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let total = decoder.total_duration();
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

impl SoundOutput for RodioOutput {
    fn load(&mut self, source: &MediaSource) -> Result<LoadedMedia, AudioError> {
        let path = source
            .local_path()
            .ok_or_else(|| AudioError::UnsupportedSource(source.to_string()))?;

        let (sink, duration) = create_sink_at(&self.stream, &path, Duration::ZERO)?;
        debug!(path = %path.display(), ?duration, "sink created");

        self.sink = Some(sink);
        self.path = Some(path);
        self.offset = Duration::ZERO;
        Ok(LoadedMedia { duration })
    }

    fn unload(&mut self) -> Result<(), AudioError> {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.path = None;
        self.offset = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.sink.as_ref().ok_or(AudioError::NotLoaded)?.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.sink.as_ref().ok_or(AudioError::NotLoaded)?.pause();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        let (Some(old), Some(path)) = (self.sink.as_ref(), self.path.as_ref()) else {
            return Err(AudioError::NotLoaded);
        };
        let was_paused = old.is_paused();
        let volume = old.volume();

        let (new_sink, _) = create_sink_at(&self.stream, path, position)?;
        new_sink.set_volume(volume);
        old.stop();
        if !was_paused {
            new_sink.play();
        }

        self.sink = Some(new_sink);
        self.offset = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.sink
            .as_ref()
            .map_or(Duration::ZERO, |s| self.offset + s.get_pos())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| s.empty())
    }

    fn fade_out(&mut self, over: Duration) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let fade_out_ms = over.as_millis() as u64;
        if fade_out_ms == 0 || sink.is_paused() {
            sink.set_volume(0.0);
            return;
        }
        let steps: u64 = 20;
        let step_ms = (fade_out_ms / steps).max(1);
        let start = sink.volume();
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            sink.set_volume(start * (1.0 - t));
            thread::sleep(Duration::from_millis(step_ms));
        }
        sink.set_volume(0.0);
    }
}
