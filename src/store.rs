//! Small key-value persistence for session and playback snapshots.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Fixed keys used by the application.
pub mod keys {
    pub const SESSION: &str = "stride.session";
    pub const AUTH_STATE: &str = "stride.auth_state";
    pub const PLAYBACK: &str = "stride.playback";
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove every key in `keys`. Missing keys are ignored.
    fn remove(&mut self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Read and decode a JSON value stored under `key`.
pub fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn set_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
