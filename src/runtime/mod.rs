use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, SystemTime};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::warn;

use crate::audio::{PlaybackCoordinator, RodioOutput};
use crate::auth::{self, HttpTokenExchange, Session};
use crate::config::Settings;
use crate::library::scan;
use crate::logging;
use crate::mpris::ControlCmd;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

mod event_loop;
mod mpris_sync;
mod resume;
mod settings;
mod startup;
mod status;

type AnyError = Box<dyn std::error::Error>;

const USAGE: &str = "usage: stride [DIR | print-config | auth-url | auth-callback <URL> | auth-status | logout]";

/// Subcommands that print and exit; anything else starts the player.
const COMMANDS: &[&str] = &[
    "print-config",
    "auth-url",
    "auth-callback",
    "auth-status",
    "logout",
    "-h",
    "--help",
];

pub fn run() -> Result<(), AnyError> {
    let (settings, problem) = settings::load_settings();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str);
    if command.is_some_and(|c| COMMANDS.contains(&c)) {
        logging::init(&settings.logging);
    } else {
        logging::init(&logging::terminal_settings(&settings));
    }
    if let Some(msg) = problem {
        warn!("{msg}");
    }

    match command {
        Some("print-config") => print_config(&settings),
        Some("auth-url") => auth_url(&settings),
        Some("auth-callback") => {
            let url = args.get(1).ok_or(USAGE)?;
            auth_callback(&settings, url)
        }
        Some("auth-status") => auth_status(&settings),
        Some("logout") => logout(&settings),
        Some("-h") | Some("--help") => {
            println!("{USAGE}");
            Ok(())
        }
        Some(dir) => play(&settings, Path::new(dir)),
        None => {
            let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("Music"));
            play(&settings, &dir)
        }
    }
}

fn print_config(settings: &Settings) -> Result<(), AnyError> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

/// The store auth commands write to. Unlike playback, these must persist.
fn persistent_store(settings: &Settings) -> Result<FileStore, AnyError> {
    let path = settings
        .storage_path()
        .ok_or("no storage location; set storage.path")?;
    Ok(FileStore::open(path)?)
}

/// Store for the playback session; falls back to memory so playback still
/// works when the state file is unusable.
fn session_store(settings: &Settings) -> Box<dyn KeyValueStore> {
    let Some(path) = settings.storage_path() else {
        warn!("no storage location; playback state will not persist");
        return Box::new(MemoryStore::default());
    };
    match FileStore::open(path.clone()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open state store; using memory");
            Box::new(MemoryStore::default())
        }
    }
}

fn auth_url(settings: &Settings) -> Result<(), AnyError> {
    let mut store = persistent_store(settings)?;
    let url = auth::begin(&settings.music_service, &mut store)?;
    println!("{url}");
    Ok(())
}

fn auth_callback(settings: &Settings, callback_url: &str) -> Result<(), AnyError> {
    let mut store = persistent_store(settings)?;
    let exchange = HttpTokenExchange::new(settings.music_service.token_endpoint.clone());
    let session = auth::complete(
        callback_url,
        &settings.music_service,
        &mut store,
        &exchange,
        SystemTime::now(),
    )?;
    println!(
        "authorized: {} token, expires at {}",
        session.token_type, session.expires_at
    );
    Ok(())
}

fn auth_status(settings: &Settings) -> Result<(), AnyError> {
    let store = persistent_store(settings)?;
    match Session::load(&store)? {
        Some(session) if !session.is_expired(SystemTime::now()) => {
            println!("signed in; token expires at {}", session.expires_at);
        }
        Some(_) => println!("session expired; run `stride auth-url` again"),
        None => println!("not signed in"),
    }
    Ok(())
}

fn logout(settings: &Settings) -> Result<(), AnyError> {
    let mut store = persistent_store(settings)?;
    auth::logout(&mut store)?;
    println!("signed out");
    Ok(())
}

fn play(settings: &Settings, dir: &Path) -> Result<(), AnyError> {
    let tracks = scan(dir, &settings.library);
    let mut store = session_store(settings);

    let output = RodioOutput::open()?;
    let mut coordinator = PlaybackCoordinator::new(output, &settings.audio);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());
    mpris_sync::attach(&mut coordinator, mpris);

    let pending_seek = startup::prepare_queue(&mut coordinator, tracks, settings, &*store);

    enable_raw_mode()?;
    let status_id = status::attach(&mut coordinator);

    let run_result: Result<(), AnyError> = (|| {
        let mut state = event_loop::EventLoopState { pending_seek };
        event_loop::run(&mut coordinator, settings, &control_tx, &control_rx, &mut state)
    })();

    coordinator.unsubscribe(status_id);
    disable_raw_mode()?;
    println!();

    if settings.playback.resume {
        resume::save(&coordinator, &mut *store);
    }
    coordinator.dispose(Duration::from_millis(settings.audio.quit_fade_out_ms));

    run_result
}

#[cfg(test)]
mod tests;
