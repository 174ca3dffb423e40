use super::load::{default_config_path, default_data_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_stride_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("STRIDE_CONFIG_PATH", "/tmp/stride-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/stride-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("stride")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("stride")
            .join("config.toml")
    );
}

#[test]
fn default_data_path_falls_back_to_local_share() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_DATA_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_data_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/share/stride/state.json")
    );
}

#[test]
fn explicit_storage_path_wins_over_xdg() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");

    let mut s = Settings::default();
    assert_eq!(
        s.storage_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-data/stride/state.json")
    );

    s.storage.path = Some("/tmp/elsewhere.json".into());
    assert_eq!(
        s.storage_path().unwrap(),
        std::path::PathBuf::from("/tmp/elsewhere.json")
    );
}

#[test]
fn settings_load_from_config_file_and_parse_flow_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
restart_threshold_ms = 1500
tick_ms = 50
quit_fade_out_ms = 0
scrub_seconds = 9

[playback]
shuffle = true
loop_track = true
resume = false

[library]
extensions = ["mp3"]
recursive = false
include_hidden = true
follow_links = false
artwork_names = ["art.png"]
attribution_separator = " / "

[music_service]
client_id = "abc123"
redirect_uri = "stride://callback"
scopes = ["streaming"]
flow = "implicit-grant"

[logging]
level = "debug"
file = "/tmp/stride.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("STRIDE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("STRIDE__AUDIO__TICK_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.restart_threshold_ms, 1500);
    assert_eq!(s.audio.tick_ms, 50);
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.audio.scrub_seconds, 9);
    assert!(s.playback.shuffle);
    assert!(s.playback.loop_track);
    assert!(!s.playback.resume);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.artwork_names, vec!["art.png".to_string()]);
    assert_eq!(s.library.attribution_separator, " / ");
    assert_eq!(s.music_service.client_id, "abc123");
    assert_eq!(s.music_service.redirect_uri, "stride://callback");
    assert_eq!(s.music_service.scopes, vec!["streaming".to_string()]);
    assert_eq!(s.music_service.flow, AuthFlow::Implicit);
    // Untouched keys keep their defaults.
    assert!(s.music_service.token_endpoint.starts_with("https://"));
    assert_eq!(s.logging.level, "debug");
    assert_eq!(
        s.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/stride.log"))
    );
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("STRIDE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("STRIDE__AUDIO__TICK_MS", "100");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_ms, 100);
}

#[test]
fn validate_rejects_zero_tick_and_empty_redirect() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());

    s.audio.tick_ms = 200;
    s.music_service.redirect_uri = "  ".into();
    assert!(s.validate().is_err());
}

#[test]
fn default_settings_serialize_to_toml() {
    let text = toml::to_string_pretty(&Settings::default()).unwrap();
    assert!(text.contains("[audio]"));
    assert!(text.contains("restart_threshold_ms = 3000"));
    assert!(text.contains("flow = \"code\""));
}
