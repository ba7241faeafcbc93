//! Which billable items currently apply to which students.
//!
//! Activations are sparse per-year sets of composite keys: `student|fee` for
//! extra fees and `student|service|month` for services. Presence means
//! active; nothing is ever stored for an inactive item.

use std::{collections::HashSet, sync::Arc};

use crate::{
  SharedStore,
  keys::{FEE_ACTIVATIONS, SERVICE_ACTIVATIONS},
  storage::{read, write},
  year::YearProvider,
};

pub fn fee_key(student_id: &str, fee_id: &str) -> String {
  format!("{student_id}|{fee_id}")
}

pub fn service_key(student_id: &str, service_id: &str, month: &str) -> String {
  format!("{student_id}|{service_id}|{month}")
}

/// Drop repeated entries, keeping the first occurrence of each.
pub(crate) fn dedup(keys: Vec<String>) -> Vec<String> {
  let mut seen = HashSet::with_capacity(keys.len());
  keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

/// Set-style add or delete on an already deduplicated list. Adding a present
/// key keeps its position.
pub(crate) fn toggle(keys: &mut Vec<String>, key: String, active: bool) {
  if active {
    if !keys.contains(&key) {
      keys.push(key);
    }
  } else {
    keys.retain(|k| *k != key);
  }
}

#[derive(Clone)]
pub struct Activations {
  store: SharedStore,
  years: Arc<dyn YearProvider>,
}

impl Activations {
  pub fn new(store: SharedStore, years: Arc<dyn YearProvider>) -> Self {
    Self { store, years }
  }

  // ── Extra fees ────────────────────────────────────────────────────────────

  pub fn active_fee_keys(&self, year: Option<&str>) -> Vec<String> {
    self.keys(FEE_ACTIVATIONS, year)
  }

  pub fn set_active_fee_keys(&self, keys: Vec<String>, year: Option<&str>) {
    self.save_keys(FEE_ACTIVATIONS, keys, year);
  }

  pub fn is_fee_active(&self, student_id: &str, fee_id: &str, year: Option<&str>) -> bool {
    let key = fee_key(student_id, fee_id);
    self.active_fee_keys(year).contains(&key)
  }

  /// Turn one student's fee on or off. The set is rewritten even when nothing
  /// changes. Returns `active`.
  pub fn set_fee_active(
    &self,
    student_id: &str,
    fee_id: &str,
    active: bool,
    year: Option<&str>,
  ) -> bool {
    self.bulk_set_fee_active([student_id], fee_id, active, year);
    active
  }

  /// Apply the same toggle to many students with a single write.
  pub fn bulk_set_fee_active<I>(&self, student_ids: I, fee_id: &str, active: bool, year: Option<&str>)
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    let keys = student_ids
      .into_iter()
      .map(|sid| fee_key(sid.as_ref(), fee_id));
    self.apply(FEE_ACTIVATIONS, keys, active, year);
  }

  // ── Services ──────────────────────────────────────────────────────────────

  pub fn active_service_keys(&self, year: Option<&str>) -> Vec<String> {
    self.keys(SERVICE_ACTIVATIONS, year)
  }

  pub fn set_active_service_keys(&self, keys: Vec<String>, year: Option<&str>) {
    self.save_keys(SERVICE_ACTIVATIONS, keys, year);
  }

  /// Always `false` for an empty month, whatever the stored set holds.
  pub fn is_service_active(
    &self,
    student_id: &str,
    service_id: &str,
    month: &str,
    year: Option<&str>,
  ) -> bool {
    if month.is_empty() {
      return false;
    }
    let key = service_key(student_id, service_id, month);
    self.active_service_keys(year).contains(&key)
  }

  pub fn set_service_active(
    &self,
    student_id: &str,
    service_id: &str,
    month: &str,
    active: bool,
    year: Option<&str>,
  ) -> bool {
    self.bulk_set_service_active([student_id], service_id, month, active, year);
    active
  }

  pub fn bulk_set_service_active<I>(
    &self,
    student_ids: I,
    service_id: &str,
    month: &str,
    active: bool,
    year: Option<&str>,
  ) where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    let keys = student_ids
      .into_iter()
      .map(|sid| service_key(sid.as_ref(), service_id, month));
    self.apply(SERVICE_ACTIVATIONS, keys, active, year);
  }

  // ── Shared ────────────────────────────────────────────────────────────────

  fn keys(&self, base: &str, year: Option<&str>) -> Vec<String> {
    read(&*self.store, &self.years.key_for(base, year), Vec::new())
  }

  fn save_keys(&self, base: &str, keys: Vec<String>, year: Option<&str>) {
    write(&*self.store, &self.years.key_for(base, year), &dedup(keys));
  }

  fn apply(
    &self,
    base: &str,
    affected: impl Iterator<Item = String>,
    active: bool,
    year: Option<&str>,
  ) {
    let year = self.years.resolve(year);
    let mut keys = dedup(self.keys(base, Some(&year)));
    for key in affected {
      toggle(&mut keys, key, active);
    }
    self.save_keys(base, keys, Some(&year));
  }
}
