//! Durable tier: a synchronous, string-keyed key-value store.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by a durable store.
///
/// The cache layer never propagates these; they are logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("failed to prepare cache location {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[cfg(test)]
  #[error("storage quota exceeded ({used} of {quota} bytes)")]
  QuotaExceeded { used: usize, quota: usize },
  #[error("store lock poisoned")]
  Poisoned,
  #[error("could not determine data directory")]
  NoDataDir,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Synchronous key-value store backing the durable cache tier.
///
/// Values are JSON-encoded strings. Implementations must be usable from
/// any thread, since queries are shared across spawned tasks.
pub trait DurableStore: Send + Sync {
  fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

  fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

  fn remove_item(&self, key: &str) -> StoreResult<()>;

  /// Every key currently held, in no particular order.
  fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Store used when persistence is disabled - all operations are no-ops.
pub struct NoopStore;

impl DurableStore for NoopStore {
  fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
    Ok(None)
  }

  fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
    Ok(())
  }

  fn remove_item(&self, _key: &str) -> StoreResult<()> {
    Ok(())
  }

  fn keys(&self) -> StoreResult<Vec<String>> {
    Ok(Vec::new())
  }
}

// ============================================================================
// In-process store
// ============================================================================

/// In-memory store with an optional byte quota, for tests.
///
/// Behaves like browser local storage: writes that would push the total size
/// of keys and values over the quota fail with `QuotaExceeded`.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
  items: Mutex<std::collections::BTreeMap<String, String>>,
  quota: Option<usize>,
  reads: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_quota(quota: usize) -> Self {
    Self {
      quota: Some(quota),
      ..Self::default()
    }
  }

  /// Number of `get_item` calls served so far.
  pub fn reads(&self) -> usize {
    self.reads.load(std::sync::atomic::Ordering::SeqCst)
  }
}

#[cfg(test)]
impl DurableStore for MemoryStore {
  fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
    self
      .reads
      .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(items.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
    let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;

    if let Some(quota) = self.quota {
      let used: usize = items
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum::<usize>()
        + key.len()
        + value.len();
      if used > quota {
        return Err(StoreError::QuotaExceeded { used, quota });
      }
    }

    items.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> StoreResult<()> {
    let mut items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
    items.remove(key);
    Ok(())
  }

  fn keys(&self) -> StoreResult<Vec<String>> {
    let items = self.items.lock().map_err(|_| StoreError::Poisoned)?;
    Ok(items.keys().cloned().collect())
  }
}

// ============================================================================
// SQLite store
// ============================================================================

/// SQLite-backed store; survives restarts.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> StoreResult<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Open a throwaway store that lives as long as the value.
  #[cfg(test)]
  pub fn open_in_memory() -> StoreResult<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  /// Default database location under the user's data directory.
  pub fn default_path() -> StoreResult<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("fieldops").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> StoreResult<Self> {
    conn.execute_batch(KV_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

impl DurableStore for SqliteStore {
  fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
    let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    let value = conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
    let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?, ?)",
      params![key, value],
    )?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> StoreResult<()> {
    let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }

  fn keys(&self) -> StoreResult<Vec<String>> {
    let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
    let mut stmt = conn.prepare("SELECT key FROM kv_store")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;
    Ok(keys)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get_item("a").unwrap(), None);

    store.set_item("a", "1").unwrap();
    store.set_item("a", "2").unwrap();
    store.set_item("b", "3").unwrap();
    assert_eq!(store.get_item("a").unwrap().as_deref(), Some("2"));

    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    store.remove_item("a").unwrap();
    assert_eq!(store.get_item("a").unwrap(), None);
  }

  #[test]
  fn test_sqlite_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("fieldops-store-{}", std::process::id()));
    let path = dir.join("cache.db");
    {
      let store = SqliteStore::open(&path).unwrap();
      store.set_item("k", "v").unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v"));
    let _ = std::fs::remove_dir_all(dir);
  }

  #[test]
  fn test_memory_store_quota() {
    let store = MemoryStore::with_quota(10);
    store.set_item("ab", "cd").unwrap();
    let err = store.set_item("key", "too long value").unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { quota: 10, .. }));
    // Replacing an existing key only counts the new value
    store.set_item("ab", "12345678").unwrap();
  }

  #[test]
  fn test_memory_store_counts_reads() {
    let store = MemoryStore::new();
    store.get_item("x").unwrap();
    store.get_item("y").unwrap();
    assert_eq!(store.reads(), 2);
  }

  #[test]
  fn test_noop_store_discards() {
    let store = NoopStore;
    store.set_item("a", "1").unwrap();
    assert_eq!(store.get_item("a").unwrap(), None);
    assert!(store.keys().unwrap().is_empty());
  }
}
