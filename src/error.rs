//! Error types for the fallible building blocks.
//!
//! The playback coordinator never lets these escape its public API; they are
//! logged and folded into the playback snapshot at that boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a sound output.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No usable output device.
    #[error("audio device error: {0}")]
    Device(String),

    /// The media locator is empty or uses a scheme we cannot play.
    #[error("unsupported media locator: {0:?}")]
    UnsupportedSource(String),

    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// A transport command was issued with nothing loaded.
    #[error("no media loaded")]
    NotLoaded,
}

/// Failures while handling the music-service authorization flow.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid callback url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The service redirected back with an `error` parameter.
    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("missing `{0}` in callback")]
    MissingParam(&'static str),

    #[error("callback state does not match the pending request")]
    StateMismatch,

    #[error("invalid expires_in value: {0:?}")]
    InvalidExpiry(String),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("music service is not configured: {0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
