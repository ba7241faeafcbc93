//! Core types and persistence logic for the Scolarite school records store.
//!
//! Every piece of application data lives in a string-keyed
//! [`KeyValueStore`]. Year-scoped data is namespaced by suffixing the base key
//! with `__{yearId}` (see [`keys`]), which is what lets [`clone`] duplicate a
//! whole academic year by walking raw keys.
//!
//! This crate has no HTTP or database dependencies.
//! Backends (`scolarite-store-sqlite`) and frontends (`scolarite-api`,
//! `scolarite-cli`) depend on it.

pub mod activation;
pub mod billing;
pub mod clock;
pub mod clone;
pub mod error;
pub mod keys;
pub mod kv;
pub mod legacy;
pub mod payment;
pub mod school;
pub mod storage;
pub mod student;
pub mod teacher;
pub mod year;

pub use error::{Error, Result, StoreError};
pub use kv::{KeyValueStore, MemoryStore, SharedStore, UnavailableStore};
pub use school::School;
pub use year::{FixedYear, YearProvider, YearRegistry};

#[cfg(test)]
mod tests;
