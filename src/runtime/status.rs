use std::io::stdout;

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tracing::debug;

use crate::audio::{Phase, PlaybackCoordinator, PlaybackState, SoundOutput, SubscriptionId};

fn clock(ms: u64) -> String {
    let secs = ms / 1_000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn status_line(state: &PlaybackState) -> String {
    let symbol = match state.phase() {
        Phase::Idle => "■",
        Phase::Loading => "…",
        Phase::Playing => "▶",
        Phase::Paused => "⏸",
    };
    match &state.current_track {
        Some(track) => format!(
            "{symbol} {}  {} / {}",
            track.display(),
            clock(state.position_ms),
            clock(state.duration_ms)
        ),
        None => format!("{symbol} stopped"),
    }
}

/// Redraw the status line whenever its text changes.
pub fn attach<O: SoundOutput>(coordinator: &mut PlaybackCoordinator<O>) -> SubscriptionId {
    let mut last = String::new();
    coordinator.subscribe(move |state| {
        let line = status_line(state);
        if line == last {
            return;
        }
        if let Err(e) = execute!(
            stdout(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(&line)
        ) {
            debug!(error = %e, "failed to draw status line");
        }
        last = line;
    })
}
