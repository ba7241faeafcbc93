//! Error types for `scolarite-core`.
//!
//! These errors are only visible through the `try_*` primitives in
//! [`crate::storage`]. The public registry APIs absorb them and fall back to
//! defaults.

use thiserror::Error;

/// A failure reported by a [`crate::KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("persistent medium is unavailable")]
  Unavailable,

  #[error("quota exceeded while writing {key:?}")]
  QuotaExceeded { key: String },

  #[error("store lock poisoned")]
  Poisoned,

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[from] StoreError),

  #[error("stored value under {key:?} failed to decode: {source}")]
  Decode {
    key:    String,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
