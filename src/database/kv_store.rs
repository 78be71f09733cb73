//! Whole-value key-value persistence.
//!
//! The link store and vault session only ever read or replace a complete
//! value under a fixed key. [`Database`] provides the durable backend;
//! [`MemoryStore`] serves hosts that bring their own persistence and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};

use super::connection::Database;
use crate::types::errors::KvError;

/// Key of the `{links, categories}` snapshot JSON.
pub const DATA_KEY: &str = "linkdeck_data_cache_v2";

/// Key of the private vault token.
pub const VAULT_TOKEN_KEY: &str = "linkdeck_private_vault";

/// Key of the vault flags JSON.
pub const VAULT_FLAGS_KEY: &str = "linkdeck_private_vault_flags";

/// Get/set by string key. Writes replace the whole value.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&self, key: &str) -> Result<(), KvError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        (**self).remove(key)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| KvError::Backend(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.connection()
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(|e| KvError::Backend(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        self.connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(|e| KvError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// Process-local store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let values = self.values.lock().map_err(|e| KvError::Backend(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut values = self.values.lock().map_err(|e| KvError::Backend(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut values = self.values.lock().map_err(|e| KvError::Backend(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}
