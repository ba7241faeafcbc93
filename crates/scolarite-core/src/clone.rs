//! Duplicating one academic year's namespaced data into another.

use serde::Serialize;

use crate::{
  KeyValueStore, Result,
  keys::{self, ROSTERS},
};

/// What a [`clone_year_data`] run did, by destination key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloneReport {
  /// Keys written from the source year.
  pub copied:  Vec<String>,
  /// Keys left alone because the destination already held a value.
  pub skipped: Vec<String>,
}

/// Copy every `*__{from}` key to `*__{to}` without overwriting, then reset the
/// destination rosters to empty lists.
///
/// A no-op when either id is empty, when they are equal, or when the store is
/// unavailable. Failures are logged and never returned; whatever was written
/// before the failure stays written.
pub fn clone_year_data(store: &dyn KeyValueStore, from: &str, to: &str) -> CloneReport {
  if from.is_empty() || to.is_empty() || from == to || !store.is_available() {
    tracing::debug!(from, to, "year clone skipped");
    return CloneReport::default();
  }

  let mut report = CloneReport::default();
  match copy_keys(store, from, to, &mut report).and_then(|()| purge_rosters(store, to)) {
    Ok(()) => tracing::info!(
      from,
      to,
      copied = report.copied.len(),
      skipped = report.skipped.len(),
      "cloned year data"
    ),
    Err(e) => tracing::warn!(from, to, error = %e, "year clone interrupted"),
  }
  report
}

fn copy_keys(
  store: &dyn KeyValueStore,
  from: &str,
  to: &str,
  report: &mut CloneReport,
) -> Result<()> {
  for (key, value) in store.snapshot()? {
    let Some(base) = keys::base_key_for(&key, from) else {
      continue;
    };
    let target = keys::key_for_year(base, to);

    let occupied = store.get(&target)?.is_some_and(|v| !v.is_empty());
    if occupied {
      report.skipped.push(target);
      continue;
    }
    store.set(&target, &value)?;
    report.copied.push(target);
  }
  Ok(())
}

fn purge_rosters(store: &dyn KeyValueStore, to: &str) -> Result<()> {
  for base in ROSTERS {
    store.set(&keys::key_for_year(base, to), "[]")?;
  }
  Ok(())
}
