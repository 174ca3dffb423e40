use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/stride/config.toml` or `~/.config/stride/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `STRIDE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub storage: StorageSettings,
    pub music_service: MusicServiceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How far into a track "previous" restarts it instead of skipping back (milliseconds).
    pub restart_threshold_ms: u64,
    /// Interval between position polls of the output (milliseconds).
    pub tick_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            restart_threshold_ms: 3_000,
            tick_ms: 200,
            quit_fade_out_ms: 300,
            scrub_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Shuffle the queue built from the library at startup.
    pub shuffle: bool,
    /// Restart the current track when it ends instead of advancing.
    pub loop_track: bool,
    /// Restore the last saved queue, cursor and position.
    pub resume: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            loop_track: false,
            resume: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// File names (case-insensitive) used as artwork for tracks in the same directory.
    pub artwork_names: Vec<String>,
    /// Separator used between artist and album in the attribution line.
    pub attribution_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            artwork_names: vec![
                "cover.jpg".into(),
                "cover.png".into(),
                "folder.jpg".into(),
                "folder.png".into(),
            ],
            attribution_separator: " · ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path of the JSON state file. Defaults to `$XDG_DATA_HOME/stride/state.json`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MusicServiceSettings {
    pub client_id: String,
    /// Only used by the authorization-code flow. Leave empty for public clients.
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_endpoint: String,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
    pub flow: AuthFlow,
}

impl Default for MusicServiceSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
            authorize_endpoint: "https://accounts.spotify.com/authorize".to_string(),
            token_endpoint: "https://accounts.spotify.com/api/token".to_string(),
            scopes: vec![
                "user-read-playback-state".into(),
                "user-modify-playback-state".into(),
            ],
            flow: AuthFlow::Code,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthFlow {
    #[serde(alias = "authorization-code", alias = "authorization_code")]
    Code,
    #[serde(alias = "token", alias = "implicit-grant", alias = "implicit_grant")]
    Implicit,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset, e.g. `info` or `stride=debug`.
    pub level: String,
    /// Write logs here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
