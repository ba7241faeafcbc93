//! Billing configuration: classes, per-class fee schedules, extra fees and
//! services.
//!
//! Classes are global. The other three are year-scoped, with a read-only
//! fallback to the un-namespaced key written before years existed.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  SharedStore,
  keys::{self, CLASSES, EXTRA_FEES, SERVICES, STUDENT_FEES},
  legacy::{decode_class, decode_entries, lenient_amount, lenient_text},
  storage::{ReadOutcome, read, try_read, try_write, write},
  year::YearProvider,
};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classe {
  #[serde(deserialize_with = "lenient_text")]
  pub id:   String,
  #[serde(alias = "nom", deserialize_with = "lenient_text")]
  pub name: String,
}

/// What a class costs for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
  #[serde(default, alias = "inscription", deserialize_with = "lenient_amount")]
  pub registration_fee: f64,
  #[serde(default, alias = "mensualite", deserialize_with = "lenient_amount")]
  pub monthly_fee:      f64,
}

/// Fee schedules keyed by class id.
pub type FeesMap = BTreeMap<String, FeeSchedule>;

/// An ad-hoc fee (uniform, exam, outing...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraFee {
  #[serde(deserialize_with = "lenient_text")]
  pub id:     String,
  #[serde(default, alias = "nom", deserialize_with = "lenient_text")]
  pub name:   String,
  #[serde(default, alias = "montant", deserialize_with = "lenient_amount")]
  pub amount: f64,
}

/// A recurring optional service billed per month (canteen, transport...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
  #[serde(deserialize_with = "lenient_text")]
  pub id:     String,
  #[serde(default, alias = "nom", deserialize_with = "lenient_text")]
  pub name:   String,
  #[serde(default, alias = "montant", deserialize_with = "lenient_amount")]
  pub amount: f64,
}

/// Which parts [`Billing::copy_year_config`] actually copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCopy {
  pub fees:       bool,
  pub extra_fees: bool,
  pub services:   bool,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Billing {
  store: SharedStore,
  years: Arc<dyn YearProvider>,
}

impl Billing {
  pub fn new(store: SharedStore, years: Arc<dyn YearProvider>) -> Self {
    Self { store, years }
  }

  // ── Classes (global) ──────────────────────────────────────────────────────

  /// Classes with both an id and a name.
  pub fn classes(&self) -> Vec<Classe> {
    let raw: Value = read(&*self.store, CLASSES, Value::Null);
    raw
      .as_array()
      .map(|items| items.iter().filter_map(decode_class).collect())
      .unwrap_or_default()
  }

  pub fn set_classes(&self, classes: &[Classe]) {
    write(&*self.store, CLASSES, classes);
  }

  // ── Year-scoped configuration ─────────────────────────────────────────────

  /// Classes whose schedule does not decode are left out.
  pub fn fees_map(&self, year: Option<&str>) -> FeesMap {
    let Value::Object(entries) = self.read_with_legacy(STUDENT_FEES, year, Value::is_object) else {
      return FeesMap::new();
    };
    entries
      .into_iter()
      .filter_map(|(class, schedule)| {
        let schedule = serde_json::from_value::<FeeSchedule>(schedule).ok()?;
        Some((class, schedule))
      })
      .collect()
  }

  pub fn set_fees_map(&self, fees: &FeesMap, year: Option<&str>) {
    write(&*self.store, &self.years.key_for(STUDENT_FEES, year), fees);
  }

  /// The fee schedule for one class, if configured.
  pub fn fee_schedule(&self, class_id: &str, year: Option<&str>) -> Option<FeeSchedule> {
    self.fees_map(year).get(class_id).copied()
  }

  pub fn extra_fees(&self, year: Option<&str>) -> Vec<ExtraFee> { self.read_list(EXTRA_FEES, year) }

  pub fn set_extra_fees(&self, fees: &[ExtraFee], year: Option<&str>) {
    write(&*self.store, &self.years.key_for(EXTRA_FEES, year), fees);
  }

  pub fn services(&self, year: Option<&str>) -> Vec<Service> { self.read_list(SERVICES, year) }

  pub fn set_services(&self, services: &[Service], year: Option<&str>) {
    write(&*self.store, &self.years.key_for(SERVICES, year), services);
  }

  /// Overwrite `to`'s fee map, extra fees and services with `from`'s.
  ///
  /// Each part is copied verbatim. A part missing in `from`, or stored with
  /// the wrong JSON shape, leaves the destination part untouched.
  pub fn copy_year_config(&self, from: &str, to: &str) -> ConfigCopy {
    let copy = ConfigCopy {
      fees:       self.copy_part(STUDENT_FEES, from, to, Value::is_object),
      extra_fees: self.copy_part(EXTRA_FEES, from, to, Value::is_array),
      services:   self.copy_part(SERVICES, from, to, Value::is_array),
    };
    tracing::debug!(from, to, ?copy, "copied year configuration");
    copy
  }

  /// The year-scoped value when it is valid JSON of the right shape, else the
  /// legacy global key. Elements are decoded by the caller, so one odd item
  /// never hands the read over to the legacy key.
  fn read_with_legacy(&self, base: &str, year: Option<&str>, shape: fn(&Value) -> bool) -> Value {
    match try_read::<Value>(&*self.store, &self.years.key_for(base, year)) {
      ReadOutcome::Found(value) if shape(&value) => value,
      _ => read(&*self.store, base, Value::Null),
    }
  }

  fn read_list<T: DeserializeOwned>(&self, base: &str, year: Option<&str>) -> Vec<T> {
    match self.read_with_legacy(base, year, Value::is_array) {
      Value::Array(items) => decode_entries(items),
      _ => Vec::new(),
    }
  }

  fn copy_part(&self, base: &str, from: &str, to: &str, shape: fn(&Value) -> bool) -> bool {
    let source = try_read::<Value>(&*self.store, &keys::key_for_year(base, from));
    match source {
      ReadOutcome::Found(value) if shape(&value) => {
        match try_write(&*self.store, &keys::key_for_year(base, to), &value) {
          Ok(()) => true,
          Err(e) => {
            tracing::warn!(base, to, error = %e, "configuration copy dropped");
            false
          }
        }
      }
      _ => false,
    }
  }
}
