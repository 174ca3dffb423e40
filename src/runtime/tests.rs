use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::event_loop::{EventLoopState, handle_control_cmd, key_command};
use super::resume::{self, PendingSeek, QueueSnapshot};
use super::startup::prepare_queue;
use super::status::status_line;
use crate::audio::testing::{FakeOutput, track};
use crate::audio::{PlaybackCoordinator, PlaybackState};
use crate::config::{AudioSettings, Settings};
use crate::mpris::ControlCmd;
use crate::store::{self, KeyValueStore, MemoryStore, keys};

fn coordinator() -> (PlaybackCoordinator<FakeOutput>, FakeOutput) {
    let output = FakeOutput::default();
    let c = PlaybackCoordinator::new(output.clone(), &AudioSettings::default());
    (c, output)
}

fn ids<O: crate::audio::SoundOutput>(c: &PlaybackCoordinator<O>) -> Vec<String> {
    c.queue().tracks().iter().map(|t| t.id.clone()).collect()
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

#[test]
fn keys_map_to_control_commands() {
    assert_eq!(key_command(key(' '), 5_000), Some(ControlCmd::PlayPause));
    assert_eq!(key_command(key('p'), 5_000), Some(ControlCmd::PlayPause));
    assert_eq!(key_command(key('l'), 5_000), Some(ControlCmd::Next));
    assert_eq!(key_command(key('b'), 5_000), Some(ControlCmd::Prev));
    assert_eq!(key_command(key('L'), 5_000), Some(ControlCmd::SeekBy(5_000)));
    assert_eq!(key_command(key('H'), 5_000), Some(ControlCmd::SeekBy(-5_000)));
    assert_eq!(key_command(key('s'), 5_000), Some(ControlCmd::Stop));
    assert_eq!(key_command(key('r'), 5_000), Some(ControlCmd::ToggleLoop));
    assert_eq!(key_command(key('q'), 5_000), Some(ControlCmd::Quit));
    assert_eq!(
        key_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), 5_000),
        Some(ControlCmd::Quit)
    );
    assert_eq!(key_command(key('c'), 5_000), None);
}

#[test]
fn play_pause_starts_the_queue_at_the_cursor_when_idle() {
    let (mut c, _out) = coordinator();
    let mut state = EventLoopState::default();
    c.set_queue(vec![track("a", 5_000), track("b", 4_000)], 1);

    assert!(!handle_control_cmd(ControlCmd::PlayPause, &mut c, &mut state));
    assert_eq!(c.state().current_track.as_ref().map(|t| t.id.as_str()), Some("b"));
    assert!(c.state().is_playing);

    handle_control_cmd(ControlCmd::PlayPause, &mut c, &mut state);
    assert!(!c.state().is_playing);
    assert!(c.state().is_loaded);
}

#[test]
fn play_on_an_empty_queue_stays_idle() {
    let (mut c, out) = coordinator();
    let mut state = EventLoopState::default();
    handle_control_cmd(ControlCmd::Play, &mut c, &mut state);
    assert_eq!(c.state(), &PlaybackState::default());
    assert!(out.0.borrow().calls.is_empty());
}

#[test]
fn relative_seek_is_clamped_at_both_ends() {
    let (mut c, _out) = coordinator();
    let mut state = EventLoopState::default();
    c.set_queue(vec![track("a", 5_000)], 0);
    handle_control_cmd(ControlCmd::Play, &mut c, &mut state);

    handle_control_cmd(ControlCmd::SeekBy(2_000), &mut c, &mut state);
    assert_eq!(c.state().position_ms, 2_000);
    handle_control_cmd(ControlCmd::SeekBy(-9_000), &mut c, &mut state);
    assert_eq!(c.state().position_ms, 0);
    handle_control_cmd(ControlCmd::SeekBy(60_000), &mut c, &mut state);
    assert_eq!(c.state().position_ms, 5_000);
}

#[test]
fn toggle_loop_and_quit() {
    let (mut c, _out) = coordinator();
    let mut state = EventLoopState::default();
    handle_control_cmd(ControlCmd::ToggleLoop, &mut c, &mut state);
    assert!(c.looping());
    handle_control_cmd(ControlCmd::ToggleLoop, &mut c, &mut state);
    assert!(!c.looping());
    assert!(handle_control_cmd(ControlCmd::Quit, &mut c, &mut state));
}

#[test]
fn pending_seek_waits_for_its_entry() {
    let (mut c, _out) = coordinator();
    let mut state = EventLoopState {
        pending_seek: Some(PendingSeek {
            index: 1,
            position_ms: 1_500,
        }),
    };
    c.set_queue(vec![track("a", 5_000), track("b", 4_000)], 0);

    handle_control_cmd(ControlCmd::Play, &mut c, &mut state);
    assert_eq!(c.state().position_ms, 0);
    assert!(state.pending_seek.is_some());

    handle_control_cmd(ControlCmd::Next, &mut c, &mut state);
    assert_eq!(c.state().position_ms, 1_500);
    assert!(state.pending_seek.is_none());

    handle_control_cmd(ControlCmd::Prev, &mut c, &mut state);
    handle_control_cmd(ControlCmd::Next, &mut c, &mut state);
    assert_eq!(c.state().position_ms, 0);
}

#[test]
fn snapshot_restore_keeps_saved_order_and_appends_new_tracks() {
    let snapshot = QueueSnapshot {
        track_ids: vec!["c".into(), "gone".into(), "a".into()],
        cursor: Some(2),
        position_ms: 800,
    };
    let library = vec![track("a", 1), track("b", 1), track("c", 1)];

    let restored = snapshot.restore(library);
    let order: Vec<&str> = restored.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
    assert_eq!(restored.cursor, 1);
    assert_eq!(
        restored.seek,
        Some(PendingSeek {
            index: 1,
            position_ms: 800
        })
    );
}

#[test]
fn snapshot_restore_without_current_track_starts_at_the_top() {
    let snapshot = QueueSnapshot {
        track_ids: vec!["gone".into(), "a".into()],
        cursor: Some(0),
        position_ms: 800,
    };
    let restored = snapshot.restore(vec![track("a", 1)]);
    assert_eq!(restored.cursor, 0);
    assert_eq!(restored.seek, None);
}

#[test]
fn snapshot_is_captured_saved_and_loaded() {
    let (mut c, _out) = coordinator();
    let mut state = EventLoopState::default();
    c.set_queue(vec![track("a", 5_000), track("b", 4_000)], 1);
    handle_control_cmd(ControlCmd::Play, &mut c, &mut state);
    handle_control_cmd(ControlCmd::SeekBy(1_200), &mut c, &mut state);

    let mut store = MemoryStore::default();
    resume::save(&c, &mut store);

    assert_eq!(
        resume::load(&store),
        Some(QueueSnapshot {
            track_ids: vec!["a".into(), "b".into()],
            cursor: Some(1),
            position_ms: 1_200,
        })
    );
}

#[test]
fn unreadable_snapshot_is_ignored() {
    let mut store = MemoryStore::default();
    store.set(keys::PLAYBACK, "not json").unwrap();
    assert_eq!(resume::load(&store), None);
}

#[test]
fn prepare_queue_restores_before_shuffling() {
    let (mut c, _out) = coordinator();
    let mut settings = Settings::default();
    settings.playback.shuffle = true;
    settings.playback.loop_track = true;

    let mut store = MemoryStore::default();
    store::set_json(
        &mut store,
        keys::PLAYBACK,
        &QueueSnapshot {
            track_ids: vec!["b".into(), "a".into()],
            cursor: Some(0),
            position_ms: 0,
        },
    )
    .unwrap();

    let seek = prepare_queue(&mut c, vec![track("a", 1), track("b", 1)], &settings, &store);
    assert_eq!(ids(&c), vec!["b", "a"]);
    assert_eq!(c.queue().cursor(), Some(0));
    assert_eq!(seek, None);
    assert!(c.looping());
}

#[test]
fn prepare_queue_without_resume_uses_library_order() {
    let (mut c, _out) = coordinator();
    let mut settings = Settings::default();
    settings.playback.resume = false;

    let mut store = MemoryStore::default();
    store::set_json(
        &mut store,
        keys::PLAYBACK,
        &QueueSnapshot {
            track_ids: vec!["b".into(), "a".into()],
            cursor: Some(1),
            position_ms: 10,
        },
    )
    .unwrap();

    let seek = prepare_queue(&mut c, vec![track("a", 1), track("b", 1)], &settings, &store);
    assert_eq!(ids(&c), vec!["a", "b"]);
    assert_eq!(c.queue().cursor(), Some(0));
    assert_eq!(seek, None);
    assert!(!c.looping());
}

#[test]
fn prepare_queue_shuffle_keeps_every_track() {
    let (mut c, _out) = coordinator();
    let mut settings = Settings::default();
    settings.playback.shuffle = true;

    let tracks: Vec<_> = (0..20).map(|i| track(&i.to_string(), 1)).collect();
    prepare_queue(&mut c, tracks, &settings, &MemoryStore::default());

    let mut seen = ids(&c);
    seen.sort_by_key(|id| id.parse::<u32>().unwrap());
    let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn status_line_shows_track_and_clock() {
    assert_eq!(status_line(&PlaybackState::default()), "■ stopped");

    let state = PlaybackState {
        is_loaded: true,
        is_playing: true,
        position_ms: 65_000,
        duration_ms: 3_723_000,
        current_track: Some(track("a", 3_723_000)),
        ..PlaybackState::default()
    };
    assert_eq!(status_line(&state), "▶ Coach - Track a  01:05 / 62:03");
}
