//! [`SqliteStore`], the SQLite implementation of [`KeyValueStore`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};

use scolarite_core::{KeyValueStore, StoreError};

use crate::{
  Error, Result,
  schema::{SCHEMA, SCHEMA_VERSION},
};

/// A stored key with its last write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
  pub key:        String,
  pub updated_at: DateTime<Utc>,
  /// Length of the stored value in bytes.
  pub size:       usize,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Scolarite key/value store backed by a single SQLite file.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path.as_ref())?;
    tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");
    Self::init(conn)
  }

  /// Open an in-memory store, useful for testing.
  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(conn: Connection) -> Result<Self> {
    let found: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if found > SCHEMA_VERSION {
      return Err(Error::SchemaVersion { found, supported: SCHEMA_VERSION });
    }
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| Error::Poisoned)
  }

  pub fn get_value(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn()?;
    let value = conn
      .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |r| r.get(0))
      .optional()?;
    Ok(value)
  }

  pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                      updated_at = excluded.updated_at",
      params![key, value, encode_dt(Utc::now())],
    )?;
    Ok(())
  }

  pub fn remove_value(&self, key: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
  }

  /// Every pair, in first-insertion order.
  pub fn pairs(&self) -> Result<Vec<(String, String)>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT key, value FROM kv ORDER BY rowid")?;
    let rows = stmt
      .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  /// Key metadata, sorted by key. Rows with an unparseable timestamp report
  /// the Unix epoch.
  pub fn keys(&self) -> Result<Vec<KeyInfo>> {
    let conn = self.conn()?;
    let mut stmt =
      conn.prepare("SELECT key, updated_at, length(CAST(value AS BLOB)) FROM kv ORDER BY key")?;
    let rows = stmt
      .query_map([], |r| {
        let updated_at: String = r.get(1)?;
        let size: i64 = r.get(2)?;
        Ok(KeyInfo {
          key:        r.get(0)?,
          updated_at: decode_dt(&updated_at),
          size:       usize::try_from(size).unwrap_or_default(),
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }
}

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.get_value(key)?)
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    Ok(self.set_value(key, value)?)
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> { Ok(self.remove_value(key)?) }

  fn snapshot(&self) -> Result<Vec<(String, String)>, StoreError> { Ok(self.pairs()?) }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

fn decode_dt(s: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_default()
}
