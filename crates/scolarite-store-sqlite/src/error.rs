//! Error type for `scolarite-store-sqlite`.

use scolarite_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("connection lock poisoned")]
  Poisoned,

  #[error("unsupported schema version {found} (expected at most {supported})")]
  SchemaVersion { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StoreError {
  fn from(e: Error) -> Self {
    match e {
      Error::Poisoned => StoreError::Poisoned,
      other => StoreError::Backend(Box::new(other)),
    }
  }
}
