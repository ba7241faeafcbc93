//! The `KeyValueStore` trait and the in-process implementations.
//!
//! The trait is implemented by storage backends (e.g.
//! `scolarite-store-sqlite`). All values are opaque strings; JSON encoding is
//! handled one level up in [`crate::storage`].

use std::{
  collections::BTreeMap,
  sync::{Arc, RwLock},
};

use crate::StoreError;

/// A key/value store shared by every component of a [`crate::School`].
pub type SharedStore = Arc<dyn KeyValueStore>;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persistent, string-keyed medium.
///
/// Every write replaces a whole value; there is no partial update and no
/// transaction spanning several keys.
pub trait KeyValueStore: Send + Sync {
  /// Fetch the raw value stored under `key`, if any.
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

  /// Delete `key`. Deleting a missing key is not an error.
  fn remove(&self, key: &str) -> Result<(), StoreError>;

  /// A point-in-time copy of every `(key, value)` pair.
  ///
  /// Year cloning walks this snapshot, so it must include every key
  /// regardless of scope.
  fn snapshot(&self) -> Result<Vec<(String, String)>, StoreError>;

  /// Whether the medium can be used at all. Callers treat an unavailable
  /// medium as an empty one.
  fn is_available(&self) -> bool { true }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// An in-memory store, ordered by key.
///
/// An optional byte quota (keys plus values) makes writes fail once the
/// store is full, like browser local storage does.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: RwLock<BTreeMap<String, String>>,
  quota:   Option<usize>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// A store that refuses writes pushing its total size past `bytes`.
  pub fn with_quota(bytes: usize) -> Self {
    Self { entries: RwLock::default(), quota: Some(bytes) }
  }

  /// Build a store pre-filled with raw pairs.
  pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    let entries = pairs
      .into_iter()
      .map(|(k, v)| (k.into(), v.into()))
      .collect();
    Self { entries: RwLock::new(entries), quota: None }
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;

    if let Some(quota) = self.quota {
      let current: usize = entries
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
      if current + key.len() + value.len() > quota {
        return Err(StoreError::QuotaExceeded { key: key.to_owned() });
      }
    }

    entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
    entries.remove(key);
    Ok(())
  }

  fn snapshot(&self) -> Result<Vec<(String, String)>, StoreError> {
    let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
    Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
  }
}

// ─── UnavailableStore ────────────────────────────────────────────────────────

/// Stands in for a host with no persistent medium (e.g. a non-interactive
/// context). Every operation fails with [`StoreError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
  fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
    Err(StoreError::Unavailable)
  }

  fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
    Err(StoreError::Unavailable)
  }

  fn remove(&self, _key: &str) -> Result<(), StoreError> {
    Err(StoreError::Unavailable)
  }

  fn snapshot(&self) -> Result<Vec<(String, String)>, StoreError> {
    Err(StoreError::Unavailable)
  }

  fn is_available(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "1").unwrap();
    store.set("a", "2").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

    store.remove("a").unwrap();
    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
  }

  #[test]
  fn memory_store_quota_rejects_oversized_write() {
    let store = MemoryStore::with_quota(8);
    store.set("k", "1234").unwrap();

    let err = store.set("other", "123456").unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { .. }));

    // Replacing an existing key only counts the new value.
    store.set("k", "1234567").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("1234567"));
  }

  #[test]
  fn snapshot_lists_every_pair() {
    let store = MemoryStore::from_pairs([("b", "2"), ("a", "1")]);
    let pairs = store.snapshot().unwrap();
    assert_eq!(pairs, vec![
      ("a".to_owned(), "1".to_owned()),
      ("b".to_owned(), "2".to_owned()),
    ]);
  }

  #[test]
  fn unavailable_store_fails_everything() {
    let store = UnavailableStore;
    assert!(!store.is_available());
    assert!(matches!(store.get("x"), Err(StoreError::Unavailable)));
    assert!(matches!(store.set("x", "y"), Err(StoreError::Unavailable)));
    assert!(matches!(store.snapshot(), Err(StoreError::Unavailable)));
  }
}
