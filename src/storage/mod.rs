//! Offline key-value persistence
//!
//! The engine keeps its state in two reserved slots of a durable key-value
//! store. This module provides:
//! - the [`StorageBackend`] trait over a raw string store
//! - a SQLite-backed implementation for the installed app
//! - an in-memory implementation for tests
//! - the [`PersistenceGateway`], the single point of contact between the
//!   engine and durable storage
//!
//! Storage never fails the learner's session: a slot that cannot be read is
//! discarded and reinitialized, a write that cannot complete is logged and
//! dropped, and the in-memory state stays authoritative either way.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// Reserved slot keys
// ============================================================

/// Slot holding the ordered answer history
pub const ANSWER_HISTORY_KEY: &str = "driving_license_answer_history";

/// Slot holding the difficulty map
pub const DIFFICULTY_MAP_KEY: &str = "driving_license_difficulty_map";

// ============================================================
// Error types
// ============================================================

/// Storage layer errors
///
/// These stay inside the storage module: the gateway converts every failure
/// into a logged diagnostic plus a safe default before callers see anything.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("lock acquisition failed: {0}")]
    Lock(String),

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// StorageBackend - raw slot store
// ============================================================

/// Raw string slot store underneath the gateway
///
/// Each key is an independent unit: a failed write to one key must leave
/// every other key's stored value intact.
pub trait StorageBackend: Send {
    /// Read a slot's raw contents, `None` if the slot does not exist
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a slot, replacing any previous contents
    fn put(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a slot; deleting a missing slot is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

// ============================================================
// SqliteBackend
// ============================================================

/// SQLite slot table schema
const INIT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS kv (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Durable backend over a local SQLite database
///
/// One row per slot. Each `put` is a single upsert statement, so a failed
/// write cannot leave a slot half-written or touch a neighboring slot.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and ensure the slot table
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(INIT_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(INIT_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================
// MemoryBackend
// ============================================================

/// In-memory backend, the substitution point for tests
#[derive(Default)]
pub struct MemoryBackend {
    slots: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail, to exercise the degraded-write path
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::WriteRejected(format!(
                "simulated quota failure for key \"{key}\""
            )));
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}

// ============================================================
// PersistenceGateway
// ============================================================

/// Single point of contact with durable storage
///
/// Cheap to clone; clones share the same backend. `load` and `save` never
/// raise: failures are logged and degrade to the caller's default (load) or
/// to keeping the prior persisted state (save).
#[derive(Clone)]
pub struct PersistenceGateway {
    backend: Arc<Mutex<dyn StorageBackend>>,
}

impl PersistenceGateway {
    /// Wrap an arbitrary backend
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Gateway over a SQLite database at `path`
    pub fn sqlite<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Ok(Self::new(SqliteBackend::open(path)?))
    }

    /// Gateway over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Load and deserialize a slot, falling back to `default`
    ///
    /// A slot that exists but cannot be parsed is removed so the next load
    /// starts clean, mirroring how the app recovers from a corrupted slot.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let mut backend = match self.backend.lock() {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("storage lock poisoned while loading \"{key}\": {e}");
                return default;
            }
        };

        let raw = match backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                log::error!("failed to read slot \"{key}\": {e}");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("discarding corrupted slot \"{key}\": {e}");
                if let Err(e) = backend.remove(key) {
                    log::error!("failed to remove corrupted slot \"{key}\": {e}");
                }
                default
            }
        }
    }

    /// Serialize and write a slot
    ///
    /// On failure the previously persisted value stays untouched and the
    /// in-memory state remains authoritative for the session.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("failed to serialize slot \"{key}\": {e}");
                return;
            }
        };

        let mut backend = match self.backend.lock() {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("storage lock poisoned while saving \"{key}\": {e}");
                return;
            }
        };

        if let Err(e) = backend.put(key, &raw) {
            log::warn!("failed to persist slot \"{key}\", keeping in-memory state: {e}");
        }
    }

    /// Write a raw string directly into a slot (test hook for corruption)
    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, raw: &str) {
        let mut backend = self.backend.lock().expect("storage lock");
        backend.put(key, raw).expect("raw put");
    }

    /// Read a slot's raw contents (test hook)
    #[cfg(test)]
    pub(crate) fn get_raw(&self, key: &str) -> Option<String> {
        let backend = self.backend.lock().expect("storage lock");
        backend.get(key).expect("raw get")
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_round_trip() {
        let gateway = PersistenceGateway::new(SqliteBackend::open_in_memory().unwrap());

        let history = vec![(1u32, 100i64), (2, 200)];
        gateway.save("slot", &history);

        let loaded: Vec<(u32, i64)> = gateway.load("slot", Vec::new());
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_sqlite_put_replaces_previous_value() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend.put("slot", "first").unwrap();
        backend.put("slot", "second").unwrap();
        assert_eq!(backend.get("slot").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_load_missing_key_returns_default() {
        let gateway = PersistenceGateway::in_memory();
        let loaded: Vec<i32> = gateway.load("missing_key", Vec::new());
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_corrupted_slot_discards_and_defaults() {
        let gateway = PersistenceGateway::in_memory();
        gateway.put_raw("slot", "{not valid json!");

        let loaded: Vec<i32> = gateway.load("slot", vec![7]);
        assert_eq!(loaded, vec![7]);

        // Corrupted contents were removed, not left to fail again.
        assert_eq!(gateway.get_raw("slot"), None);
    }

    #[test]
    fn test_load_schema_mismatch_discards_and_defaults() {
        let gateway = PersistenceGateway::in_memory();
        gateway.put_raw("slot", r#"{"unexpected": "shape"}"#);

        let loaded: Vec<i32> = gateway.load("slot", Vec::new());
        assert!(loaded.is_empty());
        assert_eq!(gateway.get_raw("slot"), None);
    }

    #[test]
    fn test_save_failure_keeps_prior_state() {
        let mut failing = MemoryBackend::new();
        failing.put("slot", "[1,2,3]").unwrap();
        failing.set_fail_writes(true);
        let gateway = PersistenceGateway::new(failing);

        gateway.save("slot", &vec![9, 9, 9]);

        let loaded: Vec<i32> = gateway.load("slot", Vec::new());
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn test_independent_slots_survive_failed_neighbor_write() {
        let mut backend = MemoryBackend::new();
        backend.put(ANSWER_HISTORY_KEY, "[]").unwrap();
        backend.set_fail_writes(true);

        assert!(backend.put(DIFFICULTY_MAP_KEY, "{}").is_err());
        assert_eq!(
            backend.get(ANSWER_HISTORY_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_remove_missing_slot_is_ok() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        assert!(backend.remove("never_written").is_ok());
    }
}
