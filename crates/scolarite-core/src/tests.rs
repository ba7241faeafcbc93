//! End-to-end scenarios through the [`School`] facade on an in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
  KeyValueStore, MemoryStore, School, UnavailableStore,
  billing::{ExtraFee, FeeSchedule, FeesMap, Service},
  clock::FixedClock,
  payment::{NewPayment, PaidSummary, PaymentFilter, PaymentKind},
  student::Student,
  teacher::Teacher,
  year::{FixedYear, YearDraft},
};

fn school_on(y: i32, m: u32, d: u32) -> (Arc<MemoryStore>, School) {
  let store = Arc::new(MemoryStore::new());
  let clock = FixedClock::on(NaiveDate::from_ymd_opt(y, m, d).unwrap());
  let school = School::with_clock(store.clone(), Arc::new(clock));
  (store, school)
}

fn school() -> (Arc<MemoryStore>, School) { school_on(2023, 10, 15) }

// ─── Years ───────────────────────────────────────────────────────────────────

#[test]
fn first_year_added_to_empty_registry_becomes_active() {
  let (_, school) = school();
  let year = school.years().add_year(YearDraft::with_id("2023-2024"));

  assert_eq!(year.id, "2023-2024");
  assert_eq!(school.years().active_year_id(), "2023-2024");
  assert_eq!(school.years().list_years().len(), 1);
}

#[test]
fn registries_follow_the_active_year() {
  let (store, school) = school();
  school.years().add_year(YearDraft::with_id("2023-2024"));
  school.activations().set_fee_active("1", "u", true, None);

  school.years().add_year(YearDraft::with_id("2024-2025"));
  school.years().set_active_year("2024-2025");
  assert!(!school.activations().is_fee_active("1", "u", None));
  assert!(school.activations().is_fee_active("1", "u", Some("2023-2024")));
  assert!(store.get("studentsFeeActivations__2023-2024").unwrap().is_some());
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[test]
fn monthly_payments_accumulate() {
  let (_, school) = school();
  let ledger = school.ledger();
  ledger.add_payment(NewPayment::new("42", PaymentKind::Monthly, 500.0).month("10"), None);
  let second =
    ledger.add_payment(NewPayment::new("42", PaymentKind::Monthly, 500.0).month("11"), None);

  let summary = ledger.sum_paid_for(&PaymentFilter::new("42", PaymentKind::Monthly), None);
  assert_eq!(summary.total, 1000.0);
  assert_eq!(summary.last.as_ref(), Some(&second));
  assert_ne!(summary.last.unwrap().id, ledger.payments(None)[0].id);
}

#[test]
fn ledgers_are_scoped_per_year() {
  let (_, school) = school();
  school.years().add_year(YearDraft::with_id("2023-2024"));
  school.years().add_year(YearDraft::with_id("2024-2025"));
  let ledger = school.ledger();
  ledger.add_payment(NewPayment::new("1", PaymentKind::Registration, 100.0), Some("2023-2024"));

  let filter = PaymentFilter::new("1", PaymentKind::Registration);
  assert_eq!(ledger.sum_paid_for(&filter, Some("2023-2024")).total, 100.0);
  assert_eq!(ledger.sum_paid_for(&filter, Some("2024-2025")), PaidSummary::default());
}

// ─── Activations ─────────────────────────────────────────────────────────────

#[test]
fn fee_toggle_round_trip() {
  let (_, school) = school();
  let act = school.activations();

  act.set_fee_active("s1", "f1", true, None);
  assert!(act.active_fee_keys(None).iter().any(|k| k == "s1|f1"));
  act.set_fee_active("s1", "f1", false, None);
  assert!(!act.active_fee_keys(None).iter().any(|k| k == "s1|f1"));
}

#[test]
fn service_with_empty_month_is_inactive() {
  let (_, school) = school();
  school.activations().set_active_service_keys(vec!["s|svc|".into()], None);
  assert!(!school.activations().is_service_active("s", "svc", "", None));
}

// ─── Cloning ─────────────────────────────────────────────────────────────────

#[test]
fn clone_never_overwrites_and_always_empties_rosters() {
  let (store, school) = school();
  store.set("studentFees__2023-2024", "Y").unwrap();
  store.set("studentFees__2024-2025", "X").unwrap();
  store.set("enrollments__2024-2025", r#"[{"studentId":"1"}]"#).unwrap();

  school.clone_year_data("2023-2024", "2024-2025");

  assert_eq!(store.get("studentFees__2024-2025").unwrap().as_deref(), Some("X"));
  assert_eq!(store.get("enrollments__2024-2025").unwrap().as_deref(), Some("[]"));
  assert_eq!(store.get("teacherAssignments__2024-2025").unwrap().as_deref(), Some("[]"));
}

#[test]
fn open_new_year_inherits_configuration_but_not_rosters() {
  let (_, school) = school();
  school.years().add_year(YearDraft::with_id("2023-2024"));

  let mut fees = FeesMap::new();
  fees.insert("CP".into(), FeeSchedule { registration_fee: 10_000.0, monthly_fee: 5_000.0 });
  school.billing().set_fees_map(&fees, None);
  school.billing().set_services(
    &[Service { id: "bus".into(), name: "Transport".into(), amount: 3_000.0 }],
    None,
  );
  school.students().upsert(Student::new("1", "Awa", "Diop"));
  school.students().enroll("1", "CP", None);
  school.teachers().upsert(Teacher::new("t1", "Fatou", "Sow"));
  school.teachers().set_assigned("t1", true, None);

  let (year, report) = school.open_new_year(YearDraft::with_id("2024-2025"), None);

  assert_eq!(year.id, "2024-2025");
  assert_eq!(school.years().active_year_id(), "2024-2025");
  assert!(report.copied.iter().any(|k| k == "studentFees__2024-2025"));
  assert_eq!(school.billing().fee_schedule("CP", None).unwrap().monthly_fee, 5_000.0);
  assert_eq!(school.billing().services(None).len(), 1);
  assert!(school.students().enrollments(None).is_empty());
  assert!(school.teachers().assigned_ids(None).is_empty());
  assert_eq!(school.students().enrollments(Some("2023-2024")).len(), 1);
}

#[test]
fn student_history_spans_years() {
  let (_, school) = school();
  school.years().add_year(YearDraft::with_id("2023-2024"));
  school.years().add_year(YearDraft::with_id("2024-2025"));
  school.students().upsert(Student::new("1", "Awa", "Diop"));
  school.students().enroll("1", "CE1", Some("2024-2025"));
  school.students().enroll("1", "CP", Some("2023-2024"));

  let history = school.students().history("1");
  let classes: Vec<_> = history.iter().map(|e| e.class_id.as_str()).collect();
  assert_eq!(classes, ["CP", "CE1"]);
}

#[test]
fn history_spans_registry_when_scoped_to_one_year() {
  let store = Arc::new(MemoryStore::new());
  let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()));
  let admin = School::with_clock(store.clone(), clock.clone());
  admin.years().add_year(YearDraft::with_id("2023-2024"));
  admin.years().add_year(YearDraft::with_id("2024-2025"));
  admin.students().enroll("1", "CP", Some("2023-2024"));
  admin.students().enroll("1", "CE1", Some("2024-2025"));

  let pinned = School::with_year_provider(store, clock, Arc::new(FixedYear("2024-2025".into())));
  let years: Vec<_> = pinned.students().history("1").into_iter().map(|e| e.year_id).collect();
  assert_eq!(years, ["2023-2024", "2024-2025"]);
}

// ─── Degraded media ──────────────────────────────────────────────────────────

#[test]
fn unavailable_medium_reads_empty_and_drops_writes() {
  let school = School::with_year_provider(
    Arc::new(UnavailableStore),
    Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2023, 10, 15).unwrap())),
    Arc::new(FixedYear("2023-2024".into())),
  );

  school.billing().set_extra_fees(
    &[ExtraFee { id: "u".into(), name: "Uniforme".into(), amount: 1.0 }],
    None,
  );
  assert!(school.billing().extra_fees(None).is_empty());
  assert!(school.students().list().is_empty());

  let p = school
    .ledger()
    .add_payment(NewPayment::new("1", PaymentKind::Service, 10.0), None);
  assert!(!p.id.is_empty());
  assert!(school.ledger().payments(None).is_empty());

  let report = school.clone_year_data("2023-2024", "2024-2025");
  assert!(report.copied.is_empty());
}

#[test]
fn unavailable_medium_still_yields_an_active_year() {
  let school = School::with_clock(
    Arc::new(UnavailableStore),
    Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
  );
  assert_eq!(school.years().active_year_id(), "2023-2024");
}
