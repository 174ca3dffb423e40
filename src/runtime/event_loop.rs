use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::audio::{PlaybackCoordinator, SoundOutput};
use crate::config;
use crate::mpris::ControlCmd;
use crate::runtime::resume::{self, PendingSeek};

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Saved position for the restored entry, applied when it first plays.
    pub pending_seek: Option<PendingSeek>,
}

/// Main terminal event loop: keys and MPRIS commands both go through the
/// control channel, and the coordinator is ticked on every idle poll.
/// Returns `Ok(())` when shutdown is requested.
pub fn run<O: SoundOutput>(
    coordinator: &mut PlaybackCoordinator<O>,
    settings: &config::Settings,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.audio.tick_ms);
    let scrub_ms = (settings.audio.scrub_seconds as i64).saturating_mul(1_000);

    loop {
        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, coordinator, state) {
                return Ok(());
            }
        }

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = key_command(key, scrub_ms) {
                    let _ = control_tx.send(cmd);
                }
            }
        } else {
            coordinator.tick();
            resume::apply_pending_seek(coordinator, &mut state.pending_seek);
        }
    }
}

/// Returns true when the runtime should shut down.
pub(super) fn handle_control_cmd<O: SoundOutput>(
    cmd: ControlCmd,
    coordinator: &mut PlaybackCoordinator<O>,
    state: &mut EventLoopState,
) -> bool {
    debug!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if coordinator.state().is_loaded {
                coordinator.resume();
            } else {
                start_queue(coordinator);
            }
        }
        ControlCmd::Pause => coordinator.pause(),
        ControlCmd::PlayPause => {
            if coordinator.state().is_loaded {
                coordinator.toggle_play_pause();
            } else {
                start_queue(coordinator);
            }
        }
        ControlCmd::Stop => coordinator.stop(),
        ControlCmd::Next => {
            coordinator.play_next();
        }
        ControlCmd::Prev => coordinator.play_previous(),
        ControlCmd::SeekBy(delta_ms) => {
            if coordinator.state().is_loaded {
                let target = (coordinator.state().position_ms as i64)
                    .saturating_add(delta_ms)
                    .max(0);
                coordinator.seek_to(target as u64);
            }
        }
        ControlCmd::ToggleLoop => {
            let on = !coordinator.looping();
            coordinator.set_looping(on);
            info!(looping = on, "loop toggled");
        }
    }

    resume::apply_pending_seek(coordinator, &mut state.pending_seek);
    false
}

/// Play from the cursor, or from the top when nothing is selected.
fn start_queue<O: SoundOutput>(coordinator: &mut PlaybackCoordinator<O>) {
    let index = coordinator.queue().cursor().unwrap_or(0);
    if !coordinator.play_from_queue(index) {
        debug!(index, "nothing to play");
    }
}

pub(super) fn key_command(key: KeyEvent, scrub_ms: i64) -> Option<ControlCmd> {
    let cmd = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => ControlCmd::Quit,
        KeyCode::Char('q') | KeyCode::Esc => ControlCmd::Quit,
        // Behave like MPRIS PlayPause.
        KeyCode::Char(' ') | KeyCode::Char('p') => ControlCmd::PlayPause,
        KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Right => ControlCmd::Next,
        KeyCode::Char('h') | KeyCode::Char('b') | KeyCode::Left => ControlCmd::Prev,
        KeyCode::Char('L') => ControlCmd::SeekBy(scrub_ms),
        KeyCode::Char('H') => ControlCmd::SeekBy(-scrub_ms),
        KeyCode::Char('s') => ControlCmd::Stop,
        KeyCode::Char('r') => ControlCmd::ToggleLoop,
        _ => return None,
    };
    Some(cmd)
}
