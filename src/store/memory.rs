use std::collections::HashMap;

use crate::error::StoreError;

use super::KeyValueStore;

/// Volatile store, used when no state file can be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        for k in keys {
            self.entries.remove(*k);
        }
        Ok(())
    }
}
