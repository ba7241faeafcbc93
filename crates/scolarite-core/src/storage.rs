//! JSON read/write primitives shared by every registry.
//!
//! [`try_read`] and [`try_write`] report exactly what happened. [`read`] and
//! [`write`] collapse that into the best-effort contract the registries
//! expose: reads fall back, writes are dropped, nothing is raised.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, KeyValueStore, Result, StoreError};

/// The outcome of reading and decoding one key.
#[derive(Debug)]
pub enum ReadOutcome<T> {
  Found(T),
  /// The key is absent or holds an empty string.
  NotFound,
  Decode(serde_json::Error),
  Io(StoreError),
}

impl<T> ReadOutcome<T> {
  pub fn found(self) -> Option<T> {
    match self {
      Self::Found(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_found(&self) -> bool { matches!(self, Self::Found(_)) }
}

/// Read and decode `key`, distinguishing every failure mode.
pub fn try_read<T: DeserializeOwned>(
  store: &dyn KeyValueStore,
  key: &str,
) -> ReadOutcome<T> {
  if !store.is_available() {
    return ReadOutcome::Io(StoreError::Unavailable);
  }
  match store.get(key) {
    Ok(Some(raw)) if !raw.is_empty() => match serde_json::from_str(&raw) {
      Ok(value) => ReadOutcome::Found(value),
      Err(e) => ReadOutcome::Decode(e),
    },
    Ok(_) => ReadOutcome::NotFound,
    Err(e) => ReadOutcome::Io(e),
  }
}

/// Read `key`, substituting `fallback` when it is missing, unreadable or
/// malformed.
pub fn read<T: DeserializeOwned>(
  store: &dyn KeyValueStore,
  key: &str,
  fallback: T,
) -> T {
  match try_read(store, key) {
    ReadOutcome::Found(value) => value,
    ReadOutcome::NotFound => fallback,
    ReadOutcome::Decode(e) => {
      let e = Error::Decode { key: key.to_owned(), source: e };
      tracing::debug!(error = %e, "using fallback");
      fallback
    }
    ReadOutcome::Io(e) => {
      tracing::debug!(key, error = %e, "read failed; using fallback");
      fallback
    }
  }
}

/// Encode and persist `value` under `key`.
pub fn try_write<T: Serialize + ?Sized>(
  store: &dyn KeyValueStore,
  key: &str,
  value: &T,
) -> Result<()> {
  if !store.is_available() {
    return Err(StoreError::Unavailable.into());
  }
  let raw = serde_json::to_string(value)?;
  store.set(key, &raw)?;
  Ok(())
}

/// Best-effort [`try_write`]: failures are logged and dropped.
pub fn write<T: Serialize + ?Sized>(
  store: &dyn KeyValueStore,
  key: &str,
  value: &T,
) {
  match try_write(store, key, value) {
    Ok(()) => {}
    Err(Error::Store(StoreError::Unavailable)) => {
      tracing::debug!(key, "no persistent medium; write dropped");
    }
    Err(e) => tracing::warn!(key, error = %e, "write dropped"),
  }
}
