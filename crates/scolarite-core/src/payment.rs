//! The per-year payment ledger.
//!
//! The ledger is an append-only JSON list under `studentPayments__{year}`.
//! Entries are never edited or removed. Entries that fail to decode are kept
//! in storage untouched and skipped by queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  SharedStore,
  clock::{Clock, timestamp},
  keys::PAYMENTS,
  legacy::{decode_entries, lenient_amount},
  storage::{ReadOutcome, read, try_read, write},
  year::YearProvider,
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// What a payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentKind {
  #[serde(alias = "inscription")]
  Registration,
  #[serde(alias = "mensualite")]
  Monthly,
  #[serde(alias = "frais")]
  ExtraFee,
  Service,
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayment {
  #[serde(default)]
  pub id:         String,
  pub student_id: String,
  #[serde(rename = "type")]
  pub kind:       PaymentKind,
  #[serde(default, alias = "classeId", skip_serializing_if = "Option::is_none")]
  pub class_id:   Option<String>,
  /// Two-digit month (`"09"`) for monthly fees and services.
  #[serde(default, alias = "mois", skip_serializing_if = "Option::is_none")]
  pub month:      Option<String>,
  /// Extra fee or service id.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub item_id:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub method:     Option<String>,
  #[serde(default, deserialize_with = "lenient_amount")]
  pub amount:     f64,
  /// ISO timestamp.
  #[serde(default)]
  pub date:       String,
}

/// Input to [`Ledger::add_payment`]. `id` and `date` are filled in when
/// absent or empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
  #[serde(default)]
  pub id:         Option<String>,
  #[serde(default)]
  pub date:       Option<String>,
  pub student_id: String,
  #[serde(rename = "type")]
  pub kind:       PaymentKind,
  #[serde(default, alias = "classeId")]
  pub class_id:   Option<String>,
  #[serde(default, alias = "mois")]
  pub month:      Option<String>,
  #[serde(default)]
  pub item_id:    Option<String>,
  #[serde(default)]
  pub method:     Option<String>,
  #[serde(default, deserialize_with = "lenient_amount")]
  pub amount:     f64,
}

impl NewPayment {
  pub fn new(student_id: impl Into<String>, kind: PaymentKind, amount: f64) -> Self {
    Self {
      id: None,
      date: None,
      student_id: student_id.into(),
      kind,
      class_id: None,
      month: None,
      item_id: None,
      method: None,
      amount,
    }
  }

  pub fn class(mut self, class_id: impl Into<String>) -> Self {
    self.class_id = Some(class_id.into());
    self
  }

  pub fn month(mut self, month: impl Into<String>) -> Self {
    self.month = Some(month.into());
    self
  }

  pub fn item(mut self, item_id: impl Into<String>) -> Self {
    self.item_id = Some(item_id.into());
    self
  }

  pub fn method(mut self, method: impl Into<String>) -> Self {
    self.method = Some(method.into());
    self
  }
}

/// Selects ledger entries for [`Ledger::sum_paid_for`]. `student_id` and
/// `kind` must match; each optional field only constrains when set to a
/// non-empty value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
  pub student_id: String,
  #[serde(rename = "type")]
  pub kind:       PaymentKind,
  #[serde(default, alias = "classeId")]
  pub class_id:   Option<String>,
  #[serde(default, alias = "mois")]
  pub month:      Option<String>,
  #[serde(default)]
  pub item_id:    Option<String>,
}

impl PaymentFilter {
  pub fn new(student_id: impl Into<String>, kind: PaymentKind) -> Self {
    Self {
      student_id: student_id.into(),
      kind,
      class_id: None,
      month: None,
      item_id: None,
    }
  }

  pub fn class(mut self, class_id: impl Into<String>) -> Self {
    self.class_id = Some(class_id.into());
    self
  }

  pub fn month(mut self, month: impl Into<String>) -> Self {
    self.month = Some(month.into());
    self
  }

  pub fn item(mut self, item_id: impl Into<String>) -> Self {
    self.item_id = Some(item_id.into());
    self
  }

  pub fn matches(&self, payment: &StudentPayment) -> bool {
    payment.student_id == self.student_id
      && payment.kind == self.kind
      && optional_matches(self.class_id.as_deref(), payment.class_id.as_deref())
      && optional_matches(self.month.as_deref(), payment.month.as_deref())
      && optional_matches(self.item_id.as_deref(), payment.item_id.as_deref())
  }
}

fn optional_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
  match wanted {
    Some(w) if !w.is_empty() => actual == Some(w),
    _ => true,
  }
}

/// Total paid over the matching entries, plus the last one appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaidSummary {
  pub total: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last:  Option<StudentPayment>,
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Ledger {
  store: SharedStore,
  years: Arc<dyn YearProvider>,
  clock: Arc<dyn Clock>,
}

impl Ledger {
  pub fn new(
    store: SharedStore,
    years: Arc<dyn YearProvider>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self { store, years, clock }
  }

  /// Every decodable entry for the year, in insertion order. Falls back to the
  /// un-namespaced legacy ledger when the year has none.
  pub fn payments(&self, year: Option<&str>) -> Vec<StudentPayment> {
    let raw = match try_read::<Vec<Value>>(&*self.store, &self.years.key_for(PAYMENTS, year)) {
      ReadOutcome::Found(entries) => entries,
      _ => read(&*self.store, PAYMENTS, Vec::new()),
    };
    decode_entries(raw)
  }

  pub fn payments_for_student(&self, student_id: &str, year: Option<&str>) -> Vec<StudentPayment> {
    self
      .payments(year)
      .into_iter()
      .filter(|p| p.student_id == student_id)
      .collect()
  }

  /// Append a payment to the year's ledger and return the stored entry.
  ///
  /// Duplicate ids are not checked.
  pub fn add_payment(&self, entry: NewPayment, year: Option<&str>) -> StudentPayment {
    let payment = StudentPayment {
      id:         non_empty(entry.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
      date:       non_empty(entry.date).unwrap_or_else(|| timestamp(self.clock.now())),
      student_id: entry.student_id,
      kind:       entry.kind,
      class_id:   entry.class_id,
      month:      entry.month,
      item_id:    entry.item_id,
      method:     entry.method,
      amount:     entry.amount,
    };

    let key = self.years.key_for(PAYMENTS, year);
    let mut ledger: Vec<Value> = read(&*self.store, &key, Vec::new());
    match serde_json::to_value(&payment) {
      Ok(value) => {
        ledger.push(value);
        write(&*self.store, &key, &ledger);
      }
      Err(e) => tracing::warn!(error = %e, "payment could not be encoded; not recorded"),
    }
    payment
  }

  /// Sum the amounts of matching entries in the year's ledger.
  ///
  /// `last` is the matching entry appended last, regardless of its `date`.
  pub fn sum_paid_for(&self, filter: &PaymentFilter, year: Option<&str>) -> PaidSummary {
    self
      .payments(year)
      .into_iter()
      .filter(|p| filter.matches(p))
      .fold(PaidSummary::default(), |acc, p| PaidSummary {
        total: acc.total + p.amount,
        last:  Some(p),
      })
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{KeyValueStore, MemoryStore, clock::FixedClock, year::FixedYear};

  fn ledger(store: &Arc<MemoryStore>) -> Ledger {
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    Ledger::new(store.clone(), Arc::new(FixedYear("2026-2027".into())), Arc::new(clock))
  }

  #[test]
  fn add_assigns_id_and_date_defaults() {
    let store = Arc::new(MemoryStore::new());
    let p = ledger(&store).add_payment(NewPayment::new("42", PaymentKind::Monthly, 500.0), None);

    assert!(Uuid::parse_str(&p.id).is_ok());
    assert_eq!(p.date, "2026-10-18T00:00:00.000Z");
    assert!(store.get("studentPayments__2026-2027").unwrap().is_some());
  }

  #[test]
  fn add_keeps_supplied_id_and_date() {
    let store = Arc::new(MemoryStore::new());
    let mut entry = NewPayment::new("42", PaymentKind::Registration, 1.0);
    entry.id = Some("p-1".into());
    entry.date = Some("2026-09-01T08:00:00.000Z".into());

    let p = ledger(&store).add_payment(entry, None);
    assert_eq!(p.id, "p-1");
    assert_eq!(p.date, "2026-09-01T08:00:00.000Z");
  }

  #[test]
  fn two_monthly_payments_sum_and_last_is_second() {
    let store = Arc::new(MemoryStore::new());
    let l = ledger(&store);
    l.add_payment(NewPayment::new("42", PaymentKind::Monthly, 500.0), None);
    let second = l.add_payment(NewPayment::new("42", PaymentKind::Monthly, 500.0), None);

    let summary = l.sum_paid_for(&PaymentFilter::new("42", PaymentKind::Monthly), None);
    assert_eq!(summary.total, 1000.0);
    assert_eq!(summary.last, Some(second));
  }

  #[test]
  fn optional_filters_narrow_matches() {
    let store = Arc::new(MemoryStore::new());
    let l = ledger(&store);
    l.add_payment(NewPayment::new("1", PaymentKind::Monthly, 100.0).class("CP").month("09"), None);
    l.add_payment(NewPayment::new("1", PaymentKind::Monthly, 200.0).class("CP").month("10"), None);
    l.add_payment(NewPayment::new("1", PaymentKind::Monthly, 400.0).class("CE1").month("10"), None);
    l.add_payment(NewPayment::new("1", PaymentKind::Service, 800.0).item("bus").month("10"), None);

    let all = l.sum_paid_for(&PaymentFilter::new("1", PaymentKind::Monthly), None);
    assert_eq!(all.total, 700.0);

    let october = l.sum_paid_for(&PaymentFilter::new("1", PaymentKind::Monthly).month("10"), None);
    assert_eq!(october.total, 600.0);

    let cp_oct = PaymentFilter::new("1", PaymentKind::Monthly).class("CP").month("10");
    assert_eq!(l.sum_paid_for(&cp_oct, None).total, 200.0);

    let empty_is_omitted = PaymentFilter::new("1", PaymentKind::Monthly).class("");
    assert_eq!(l.sum_paid_for(&empty_is_omitted, None).total, 700.0);
  }

  #[test]
  fn impossible_filter_yields_zero() {
    let store = Arc::new(MemoryStore::new());
    let l = ledger(&store);
    l.add_payment(NewPayment::new("1", PaymentKind::Monthly, 100.0), None);

    let summary = l.sum_paid_for(&PaymentFilter::new("nobody", PaymentKind::Monthly), None);
    assert_eq!(summary, PaidSummary { total: 0.0, last: None });
  }

  #[test]
  fn last_is_insertion_order_not_date() {
    let store = Arc::new(MemoryStore::new());
    let l = ledger(&store);
    let mut late = NewPayment::new("1", PaymentKind::Registration, 1.0);
    late.date = Some("2030-01-01T00:00:00.000Z".into());
    l.add_payment(late, None);
    let mut backdated = NewPayment::new("1", PaymentKind::Registration, 2.0);
    backdated.date = Some("2020-01-01T00:00:00.000Z".into());
    let backdated = l.add_payment(backdated, None);

    let summary = l.sum_paid_for(&PaymentFilter::new("1", PaymentKind::Registration), None);
    assert_eq!(summary.last, Some(backdated));
  }

  #[test]
  fn legacy_ledger_and_invalid_amounts() {
    let store = Arc::new(MemoryStore::from_pairs([(
      PAYMENTS,
      r#"[
        {"id":"a","studentId":"1","type":"mensualite","mois":"09","amount":"250","date":"x"},
        {"id":"b","studentId":"1","type":"mensualite","amount":"abc","date":"x"},
        {"id":"c","studentId":"1","type":"mensualite","amount":null,"date":"x"},
        {"id":"d","studentId":"1","type":"unknown-kind","amount":9,"date":"x"}
      ]"#,
    )]));
    let l = ledger(&store);

    let payments = l.payments(None);
    assert_eq!(payments.len(), 3);
    assert_eq!(payments[0].month.as_deref(), Some("09"));

    let summary = l.sum_paid_for(&PaymentFilter::new("1", PaymentKind::Monthly), None);
    assert_eq!(summary.total, 250.0);
    assert_eq!(summary.last.unwrap().id, "c");
  }

  #[test]
  fn append_preserves_undecodable_entries() {
    let store = Arc::new(MemoryStore::from_pairs([(
      "studentPayments__2026-2027",
      r#"[{"id":"odd","type":"from-the-future"}]"#,
    )]));
    let l = ledger(&store);
    l.add_payment(NewPayment::new("1", PaymentKind::Service, 10.0), None);

    let raw: Vec<Value> =
      serde_json::from_str(&store.get("studentPayments__2026-2027").unwrap().unwrap()).unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0]["id"], "odd");
    assert_eq!(raw[1]["type"], "service");
  }

  #[test]
  fn payments_for_student_filters() {
    let store = Arc::new(MemoryStore::new());
    let l = ledger(&store);
    l.add_payment(NewPayment::new("1", PaymentKind::Service, 10.0), None);
    l.add_payment(NewPayment::new("2", PaymentKind::Service, 10.0), None);
    assert_eq!(l.payments_for_student("2", None).len(), 1);
  }

  #[test]
  fn kind_wire_names() {
    assert_eq!(serde_json::to_value(PaymentKind::ExtraFee).unwrap(), "extraFee");
    assert_eq!(serde_json::to_value(PaymentKind::Registration).unwrap(), "registration");
    let k: PaymentKind = serde_json::from_str("\"frais\"").unwrap();
    assert_eq!(k, PaymentKind::ExtraFee);
  }
}
