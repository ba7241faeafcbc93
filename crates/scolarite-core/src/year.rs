//! Academic years and the active-year pointer.
//!
//! The registry owns two global keys: the ordered list of years and the id of
//! the active one. Every other year-scoped component asks a [`YearProvider`]
//! for the year to use when the caller does not name one.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::{
  KeyValueStore, SharedStore,
  clock::Clock,
  keys::{self, ACADEMIC_YEARS, ACTIVE_YEAR_ID},
  legacy::{decode_entries, has_field, lenient_text},
  storage::{read, write},
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A school year, e.g. `2024-2025`. The id is stable and namespaces every
/// year-scoped key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
  #[serde(deserialize_with = "lenient_text")]
  pub id:         String,
  #[serde(default, alias = "nom", deserialize_with = "lenient_text")]
  pub name:       String,
  /// ISO date, `YYYY-MM-DD`.
  #[serde(default, alias = "debut", deserialize_with = "lenient_text")]
  pub start_date: String,
  /// ISO date, `YYYY-MM-DD`.
  #[serde(default, alias = "fin", deserialize_with = "lenient_text")]
  pub end_date:   String,
  #[serde(default)]
  pub closed:     bool,
}

/// Input to [`YearRegistry::add_year`]. Missing or empty fields take the
/// values of the default year for today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDraft {
  pub id:         Option<String>,
  #[serde(alias = "nom")]
  pub name:       Option<String>,
  #[serde(alias = "debut")]
  pub start_date: Option<String>,
  #[serde(alias = "fin")]
  pub end_date:   Option<String>,
  pub closed:     Option<bool>,
}

impl YearDraft {
  pub fn with_id(id: impl Into<String>) -> Self {
    Self { id: Some(id.into()), ..Self::default() }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }
}

/// The academic year containing `date`. Years run from September 1st to
/// August 31st.
pub fn default_year_for(date: NaiveDate) -> AcademicYear {
  let start = if date.month() >= 9 { date.year() } else { date.year() - 1 };
  let end = start + 1;
  AcademicYear {
    id:         format!("{start}-{end}"),
    name:       format!("Année scolaire {start}-{end}"),
    start_date: format!("{start}-09-01"),
    end_date:   format!("{end}-08-31"),
    closed:     false,
  }
}

// ─── YearProvider ────────────────────────────────────────────────────────────

/// Supplies the year used when an operation is not given one explicitly.
pub trait YearProvider: Send + Sync {
  fn active_year_id(&self) -> String;

  /// `year` unless it is absent or empty, else the active year.
  fn resolve(&self, year: Option<&str>) -> String {
    match year {
      Some(y) if !y.is_empty() => y.to_owned(),
      _ => self.active_year_id(),
    }
  }

  /// `"{base}__{year}"`, resolving `year` through [`Self::resolve`].
  fn key_for(&self, base: &str, year: Option<&str>) -> String {
    keys::key_for_year(base, &self.resolve(year))
  }
}

/// A provider pinned to one year; nothing is read from storage.
#[derive(Debug, Clone)]
pub struct FixedYear(pub String);

impl YearProvider for FixedYear {
  fn active_year_id(&self) -> String { self.0.clone() }
}

/// Registered years in storage order. Entries that do not decode, or that
/// have no id, are skipped but stay in storage.
pub fn stored_years(store: &dyn KeyValueStore) -> Vec<AcademicYear> {
  decode_entries::<AcademicYear>(read(store, ACADEMIC_YEARS, Vec::new()))
    .into_iter()
    .filter(|y| !y.id.is_empty())
    .collect()
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The list of academic years plus the active-year pointer.
pub struct YearRegistry {
  store:   SharedStore,
  clock:   Arc<dyn Clock>,
  changes: watch::Sender<Option<String>>,
}

impl YearRegistry {
  pub fn new(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
    let (changes, _) = watch::channel(None);
    Self { store, clock, changes }
  }

  /// Years in storage order; see [`stored_years`].
  pub fn list_years(&self) -> Vec<AcademicYear> { stored_years(&*self.store) }

  /// Replace the whole registry.
  pub fn save_years(&self, years: &[AcademicYear]) {
    write(&*self.store, ACADEMIC_YEARS, years);
  }

  /// The active year id. When no valid pointer is stored, a default year is
  /// ensured and made active first, so the result is never empty.
  pub fn active_year_id(&self) -> String {
    let years = self.list_years();
    if let Some(id) = self.stored_pointer()
      && years.iter().any(|y| y.id == id)
    {
      return id;
    }
    self.ensure_default_year().id
  }

  pub fn active_year(&self) -> Option<AcademicYear> {
    let id = self.active_year_id();
    self.list_years().into_iter().find(|y| y.id == id)
  }

  /// Point the registry at `id` and publish the change to subscribers.
  ///
  /// Subscribers observe the new id on their next poll of the watch channel;
  /// no listener code runs on the caller's stack.
  pub fn set_active_year(&self, id: &str) {
    write(&*self.store, ACTIVE_YEAR_ID, id);
    self.changes.send_replace(Some(id.to_owned()));
    tracing::info!(year = id, "active year changed");
  }

  /// Receive active-year changes made through this registry.
  pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
    self.changes.subscribe()
  }

  /// Register a year built from `draft` over today's defaults.
  ///
  /// An existing year with the same id is left as is. If no year was active
  /// before, the new one becomes active.
  pub fn add_year(&self, draft: YearDraft) -> AcademicYear {
    let base = default_year_for(self.clock.today());
    let year = AcademicYear {
      id:         non_empty(draft.id).unwrap_or(base.id),
      name:       non_empty(draft.name).unwrap_or(base.name),
      start_date: non_empty(draft.start_date).unwrap_or(base.start_date),
      end_date:   non_empty(draft.end_date).unwrap_or(base.end_date),
      closed:     draft.closed.unwrap_or(false),
    };

    let raw = self.raw_years();
    if !raw.iter().any(|entry| has_field(entry, "id", &year.id)) {
      self.append_year(raw, &year);
    }

    if self.stored_pointer().is_none() {
      self.set_active_year(&year.id);
    }
    year
  }

  /// Guarantee at least one registered year and a pointer that resolves.
  ///
  /// An empty registry gets the default year for today, made active. Otherwise
  /// a missing or dangling pointer is moved to the first registered year.
  pub fn ensure_default_year(&self) -> AcademicYear {
    let years = self.list_years();
    let Some(first) = years.first() else {
      let year = default_year_for(self.clock.today());
      self.append_year(self.raw_years(), &year);
      self.set_active_year(&year.id);
      return year;
    };

    let resolves = self
      .stored_pointer()
      .is_some_and(|id| years.iter().any(|y| y.id == id));
    if !resolves {
      self.set_active_year(&first.id);
    }
    first.clone()
  }

  /// Flag a year as closed (or reopen it). Returns `false` if `id` is unknown.
  pub fn set_year_closed(&self, id: &str, closed: bool) -> bool {
    let mut raw = self.raw_years();
    let Some(entry) = raw
      .iter_mut()
      .filter(|entry| has_field(entry, "id", id))
      .find_map(Value::as_object_mut)
    else {
      return false;
    };
    entry.insert("closed".into(), Value::Bool(closed));
    write(&*self.store, ACADEMIC_YEARS, &raw);
    true
  }

  /// `"{base}__{year}"`, defaulting to the active year.
  pub fn key_for_year(&self, base: &str, year: Option<&str>) -> String {
    YearProvider::key_for(self, base, year)
  }

  fn raw_years(&self) -> Vec<Value> { read(&*self.store, ACADEMIC_YEARS, Vec::new()) }

  /// Append `year` to the stored list, keeping every existing entry as is.
  fn append_year(&self, mut raw: Vec<Value>, year: &AcademicYear) {
    match serde_json::to_value(year) {
      Ok(value) => {
        raw.push(value);
        write(&*self.store, ACADEMIC_YEARS, &raw);
      }
      Err(e) => tracing::warn!(year = %year.id, error = %e, "year could not be encoded"),
    }
  }

  fn stored_pointer(&self) -> Option<String> {
    read::<Option<String>>(&*self.store, ACTIVE_YEAR_ID, None)
      .filter(|id| !id.is_empty())
  }
}

impl YearProvider for YearRegistry {
  fn active_year_id(&self) -> String { Self::active_year_id(self) }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{KeyValueStore, MemoryStore, clock::FixedClock};

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn registry_on(today: NaiveDate) -> (Arc<MemoryStore>, YearRegistry) {
    let store = Arc::new(MemoryStore::new());
    let registry = YearRegistry::new(store.clone(), Arc::new(FixedClock::on(today)));
    (store, registry)
  }

  #[test]
  fn default_year_follows_september_rule() {
    assert_eq!(default_year_for(date(2024, 9, 1)).id, "2024-2025");
    assert_eq!(default_year_for(date(2024, 12, 31)).id, "2024-2025");
    assert_eq!(default_year_for(date(2025, 8, 31)).id, "2024-2025");
    assert_eq!(default_year_for(date(2025, 1, 15)).id, "2024-2025");

    let y = default_year_for(date(2025, 10, 2));
    assert_eq!(y.id, "2025-2026");
    assert_eq!(y.start_date, "2025-09-01");
    assert_eq!(y.end_date, "2026-08-31");
    assert!(!y.closed);
  }

  #[test]
  fn active_year_on_empty_registry_creates_default() {
    let (store, registry) = registry_on(date(2026, 10, 18));

    let id = registry.active_year_id();
    assert_eq!(id, "2026-2027");

    let years = registry.list_years();
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].id, id);
    assert_eq!(store.get(ACTIVE_YEAR_ID).unwrap().as_deref(), Some("\"2026-2027\""));

    // Stable on repeat.
    assert_eq!(registry.active_year_id(), id);
    assert_eq!(registry.list_years().len(), 1);
  }

  #[test]
  fn add_year_on_empty_registry_becomes_active() {
    let (_store, registry) = registry_on(date(2026, 3, 1));

    let year = registry.add_year(YearDraft::with_id("2023-2024").named("Y1"));
    assert_eq!(year.name, "Y1");
    assert_eq!(year.start_date, "2025-09-01");

    let years = registry.list_years();
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].id, "2023-2024");
    assert_eq!(registry.active_year_id(), "2023-2024");
  }

  #[test]
  fn add_year_does_not_duplicate_or_steal_active() {
    let (_store, registry) = registry_on(date(2026, 3, 1));
    registry.add_year(YearDraft::with_id("2023-2024"));
    registry.add_year(YearDraft::with_id("2024-2025"));
    registry.add_year(YearDraft::with_id("2023-2024").named("ignored"));

    let ids: Vec<_> = registry.list_years().into_iter().map(|y| y.id).collect();
    assert_eq!(ids, ["2023-2024", "2024-2025"]);
    assert_eq!(registry.active_year_id(), "2023-2024");
  }

  #[test]
  fn empty_draft_fields_take_defaults() {
    let (_store, registry) = registry_on(date(2026, 9, 5));
    let year = registry.add_year(YearDraft {
      id: Some(String::new()),
      ..YearDraft::default()
    });
    assert_eq!(year.id, "2026-2027");
    assert_eq!(year.name, "Année scolaire 2026-2027");
  }

  #[test]
  fn dangling_pointer_is_repaired_to_first_year() {
    let (_store, registry) = registry_on(date(2026, 3, 1));
    registry.add_year(YearDraft::with_id("2023-2024"));
    registry.add_year(YearDraft::with_id("2024-2025"));
    registry.set_active_year("1999-2000");

    assert_eq!(registry.active_year_id(), "2023-2024");
  }

  #[test]
  fn legacy_french_field_names_decode() {
    let store = Arc::new(MemoryStore::from_pairs([(
      ACADEMIC_YEARS,
      r#"[{"id":"2022-2023","nom":"Ancienne","debut":"2022-09-01","fin":"2023-08-31"}]"#,
    )]));
    let registry = YearRegistry::new(store, Arc::new(FixedClock::on(date(2026, 1, 1))));

    let years = registry.list_years();
    assert_eq!(years[0].name, "Ancienne");
    assert_eq!(years[0].start_date, "2022-09-01");
    assert!(!years[0].closed);
  }

  #[test]
  fn close_and_reopen_year() {
    let (_store, registry) = registry_on(date(2026, 3, 1));
    registry.add_year(YearDraft::with_id("2023-2024"));

    assert!(registry.set_year_closed("2023-2024", true));
    assert!(registry.list_years()[0].closed);
    assert!(registry.set_year_closed("2023-2024", false));
    assert!(!registry.list_years()[0].closed);
    assert!(!registry.set_year_closed("nope", true));
  }

  #[test]
  fn odd_entries_survive_and_numeric_ids_decode() {
    let store = Arc::new(MemoryStore::from_pairs([
      (ACADEMIC_YEARS, r#"[{"id":"2022-2023"},{"id":2023},"junk"]"#),
      (ACTIVE_YEAR_ID, r#""2022-2023""#),
    ]));
    let registry = YearRegistry::new(store.clone(), Arc::new(FixedClock::on(date(2026, 1, 1))));

    assert_eq!(registry.active_year_id(), "2022-2023");
    let ids: Vec<_> = registry.list_years().into_iter().map(|y| y.id).collect();
    assert_eq!(ids, ["2022-2023", "2023"]);

    registry.add_year(YearDraft::with_id("2024-2025"));
    assert!(registry.set_year_closed("2023", true));

    let raw: Vec<Value> =
      serde_json::from_str(&store.get(ACADEMIC_YEARS).unwrap().unwrap()).unwrap();
    assert_eq!(raw.len(), 4);
    assert_eq!(raw[1]["id"], 2023);
    assert_eq!(raw[1]["closed"], true);
    assert_eq!(raw[2], "junk");
    assert_eq!(raw[3]["id"], "2024-2025");
    assert_eq!(registry.active_year_id(), "2022-2023");
  }

  #[test]
  fn undecodable_registry_entries_do_not_trigger_a_reset() {
    let store = Arc::new(MemoryStore::from_pairs([(ACADEMIC_YEARS, r#"[42,{"nom":"x"}]"#)]));
    let registry = YearRegistry::new(store.clone(), Arc::new(FixedClock::on(date(2026, 1, 1))));

    assert_eq!(registry.active_year_id(), "2025-2026");
    let raw: Vec<Value> =
      serde_json::from_str(&store.get(ACADEMIC_YEARS).unwrap().unwrap()).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[0], 42);
  }

  #[tokio::test]
  async fn subscribers_see_active_year_changes() {
    let (_store, registry) = registry_on(date(2026, 3, 1));
    let mut rx = registry.subscribe();

    registry.set_active_year("2030-2031");
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_deref(), Some("2030-2031"));
  }

  #[test]
  fn key_for_year_defaults_to_active() {
    let (_store, registry) = registry_on(date(2026, 3, 1));
    registry.add_year(YearDraft::with_id("2023-2024"));
    assert_eq!(registry.key_for_year("enrollments", None), "enrollments__2023-2024");
    assert_eq!(registry.key_for_year("enrollments", Some("x")), "enrollments__x");
    assert_eq!(registry.key_for_year("enrollments", Some("")), "enrollments__2023-2024");
  }
}
