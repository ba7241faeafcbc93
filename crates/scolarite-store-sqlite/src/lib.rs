//! SQLite backend for the Scolarite key/value store.
//!
//! Every key lives in one `kv` table. Access goes through a single
//! connection behind a mutex, so writes are serialised the same way they are
//! against browser local storage.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
