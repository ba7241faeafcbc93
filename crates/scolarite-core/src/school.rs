//! The [`School`] facade wiring every registry to one store and one year
//! source.

use std::sync::Arc;

use crate::{
  SharedStore,
  activation::Activations,
  billing::Billing,
  clock::{Clock, SystemClock},
  clone::{CloneReport, clone_year_data},
  payment::Ledger,
  student::Students,
  teacher::Teachers,
  year::{AcademicYear, YearDraft, YearProvider, YearRegistry},
};

/// Every registry of one school, sharing a store.
///
/// Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct School {
  store:       SharedStore,
  years:       Arc<YearRegistry>,
  students:    Students,
  teachers:    Teachers,
  billing:     Billing,
  activations: Activations,
  ledger:      Ledger,
}

impl School {
  /// A school on `store`, using wall-clock time.
  pub fn new(store: SharedStore) -> Self { Self::with_clock(store, Arc::new(SystemClock)) }

  pub fn with_clock(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
    let years = Arc::new(YearRegistry::new(store.clone(), clock.clone()));
    Self::assemble(store, clock, years.clone(), years)
  }

  /// Scope every registry to `provider` instead of the stored active year.
  /// Year administration still goes through the stored registry.
  pub fn with_year_provider(
    store: SharedStore,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn YearProvider>,
  ) -> Self {
    let years = Arc::new(YearRegistry::new(store.clone(), clock.clone()));
    Self::assemble(store, clock, years, provider)
  }

  fn assemble(
    store: SharedStore,
    clock: Arc<dyn Clock>,
    years: Arc<YearRegistry>,
    provider: Arc<dyn YearProvider>,
  ) -> Self {
    Self {
      students: Students::new(store.clone(), provider.clone(), clock.clone()),
      teachers: Teachers::new(store.clone(), provider.clone()),
      billing: Billing::new(store.clone(), provider.clone()),
      activations: Activations::new(store.clone(), provider.clone()),
      ledger: Ledger::new(store.clone(), provider, clock),
      store,
      years,
    }
  }

  pub fn years(&self) -> &YearRegistry { &self.years }

  pub fn students(&self) -> &Students { &self.students }

  pub fn teachers(&self) -> &Teachers { &self.teachers }

  pub fn billing(&self) -> &Billing { &self.billing }

  pub fn activations(&self) -> &Activations { &self.activations }

  pub fn ledger(&self) -> &Ledger { &self.ledger }

  pub fn store(&self) -> &SharedStore { &self.store }

  /// See [`clone_year_data`].
  pub fn clone_year_data(&self, from: &str, to: &str) -> CloneReport {
    clone_year_data(&*self.store, from, to)
  }

  /// Register a new year, seed it from `from` (the active year by default)
  /// and make it active.
  pub fn open_new_year(
    &self,
    draft: YearDraft,
    from: Option<&str>,
  ) -> (AcademicYear, CloneReport) {
    let source = match from {
      Some(id) if !id.is_empty() => id.to_owned(),
      _ => self.years.active_year_id(),
    };
    let year = self.years.add_year(draft);
    let report = self.clone_year_data(&source, &year.id);
    self.years.set_active_year(&year.id);
    tracing::info!(from = %source, to = %year.id, "opened new academic year");
    (year, report)
  }
}
