//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, Settings};

const TERMINAL_LOG_NAME: &str = "stride.log";

/// Logging for the raw-mode player. Stderr lines would tear through the
/// status line, so logs go to `stride.log` next to the state file unless a
/// file is configured. With nowhere to write, only errors reach stderr.
pub fn terminal_settings(settings: &Settings) -> LoggingSettings {
    let mut logging = settings.logging.clone();
    if logging.file.is_some() {
        return logging;
    }
    let beside_state = settings
        .storage_path()
        .and_then(|p| p.parent().map(|dir| dir.join(TERMINAL_LOG_NAME)));
    match beside_state {
        Some(path) => logging.file = Some(path),
        None => logging.level = "error".to_string(),
    }
    logging
}

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `logging.level`. Logs go to `logging.file` when set, stderr otherwise.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if let Some(path) = &settings.file {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
                return;
            }
            Err(e) => {
                eprintln!("stride: cannot open log file {}: {e}", path.display());
            }
        }
    }

    let _ = builder.with_writer(std::io::stderr).try_init();
}
