//! MPRIS (`org.mpris.MediaPlayer2`) transport surface on the session bus.
//!
//! The bus thread never touches the coordinator. Method calls become
//! `ControlCmd`s on the runtime channel; the runtime mirrors playback
//! snapshots back into `SharedState` through `MprisHandle::update`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use url::Url;
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::audio::{Phase, PlaybackState};
use crate::library::Track;

const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/track/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in milliseconds.
    SeekBy(i64),
    ToggleLoop,
}

#[derive(Debug, Default)]
struct SharedState {
    phase: Option<Phase>,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    track_id: Option<OwnedObjectPath>,
}

#[derive(Clone)]
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

/// D-Bus object paths only allow `[A-Za-z0-9_]` per element.
fn track_object_path(id: &str) -> Option<OwnedObjectPath> {
    let element: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let element = if element.is_empty() { "_".to_string() } else { element };
    OwnedObjectPath::try_from(format!("{TRACK_PATH_PREFIX}{element}")).ok()
}

impl MprisHandle {
    /// Mirror a coordinator snapshot.
    pub fn update(&self, snapshot: &PlaybackState) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        s.phase = Some(snapshot.phase());
        s.position_micros = (snapshot.position_ms as i64).saturating_mul(1_000);
        s.length_micros = (snapshot.duration_ms > 0).then(|| snapshot.duration_ms as i64 * 1_000);
        set_track(&mut s, snapshot.current_track.as_ref());
    }
}

fn set_track(s: &mut SharedState, track: Option<&Track>) {
    match track {
        Some(t) => {
            s.title = Some(t.name.clone());
            s.artist = if t.attribution.is_empty() {
                Vec::new()
            } else {
                vec![t.attribution.clone()]
            };
            s.url = match t.source.local_path() {
                Some(p) => Url::from_file_path(p).ok().map(String::from),
                None => Some(t.source.to_string()),
            };
            s.art_url = t
                .artwork
                .as_ref()
                .and_then(|a| Url::from_file_path(a).ok())
                .map(String::from);
            s.track_id = track_object_path(&t.id);
        }
        None => {
            s.title = None;
            s.artist.clear();
            s.url = None;
            s.art_url = None;
            s.length_micros = None;
            s.track_id = None;
        }
    }
}

/// Forward `cmd`. The receiver is gone once the runtime has shut down.
fn send(tx: &Sender<ControlCmd>, cmd: ControlCmd) {
    if let Err(e) = tx.send(cmd) {
        debug!(cmd = ?e.0, "MPRIS: runtime no longer listening");
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        send(&self.tx, ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "stride"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(v: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(v).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        send(&self.tx, ControlCmd::Next);
    }

    fn previous(&self) {
        send(&self.tx, ControlCmd::Prev);
    }

    fn play(&self) {
        send(&self.tx, ControlCmd::Play);
    }

    fn pause(&self) {
        send(&self.tx, ControlCmd::Pause);
    }

    fn play_pause(&self) {
        send(&self.tx, ControlCmd::PlayPause);
    }

    fn stop(&self) {
        send(&self.tx, ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        send(&self.tx, ControlCmd::SeekBy(offset / 1_000));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.phase {
            Some(Phase::Playing) | Some(Phase::Loading) => "Playing",
            Some(Phase::Paused) => "Paused",
            Some(Phase::Idle) | None => "Stopped",
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map_or(0, |s| s.position_micros)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            if let Some(v) = owned(Value::from(id.clone().into_inner())) {
                map.insert("mpris:trackid".to_string(), v);
            }
        }
        if let Some(title) = &s.title {
            if let Some(v) = owned(Value::from(title.clone())) {
                map.insert("xesam:title".to_string(), v);
            }
        }
        if !s.artist.is_empty() {
            if let Some(v) = owned(Value::from(s.artist.clone())) {
                map.insert("xesam:artist".to_string(), v);
            }
        }
        if let Some(url) = &s.url {
            if let Some(v) = owned(Value::from(url.clone())) {
                map.insert("xesam:url".to_string(), v);
            }
        }
        if let Some(art) = &s.art_url {
            if let Some(v) = owned(Value::from(art.clone())) {
                map.insert("mpris:artUrl".to_string(), v);
            }
        }
        if let Some(len) = s.length_micros {
            if let Some(v) = owned(Value::from(len)) {
                map.insert("mpris:length".to_string(), v);
            }
        }
        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let path = "/org/mpris/MediaPlayer2";

            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "MPRIS: failed to connect to session bus");
                    return;
                }
            };

            if let Err(e) = connection
                .request_name("org.mpris.MediaPlayer2.stride")
                .await
            {
                warn!(error = %e, "MPRIS: failed to acquire name");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server.at(path, RootIface { tx: tx.clone() }).await {
                warn!(error = %e, "MPRIS: failed to register root iface");
                return;
            }

            if let Err(e) = object_server
                .at(
                    path,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!(error = %e, "MPRIS: failed to register player iface");
                return;
            }
            info!("MPRIS service registered");

            // Keep the service alive.
            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}
