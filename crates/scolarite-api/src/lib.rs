//! JSON REST API for Scolarite.
//!
//! Exposes an axum [`Router`] over a [`School`]. Year-scoped endpoints accept
//! an optional `?year=<id>` and default to the active year. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", scolarite_api::api_router(school.clone()))
//! ```

pub mod activations;
pub mod billing;
pub mod error;
pub mod payments;
pub mod students;
pub mod teachers;
pub mod years;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use scolarite_core::School;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// `?year=<id>`; absent or empty means the active year.
#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
  pub year: Option<String>,
}

impl YearQuery {
  pub fn year(&self) -> Option<&str> { self.year.as_deref() }
}

/// Run `f` against the school on tokio's blocking pool. Every registry call
/// is synchronous and may wait on the SQLite connection lock.
pub(crate) async fn run<T, F>(school: &Arc<School>, f: F) -> Result<T, ApiError>
where
  T: Send + 'static,
  F: FnOnce(&School) -> T + Send + 'static,
{
  let school = Arc::clone(school);
  Ok(tokio::task::spawn_blocking(move || f(&school)).await?)
}

/// Build a fully-materialised API router for `school`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(school: Arc<School>) -> Router<()> {
  Router::new()
    // Years
    .route("/years", get(years::list).post(years::create))
    .route("/years/active", get(years::active).put(years::set_active))
    .route("/years/clone", post(years::clone_data))
    .route("/years/open", post(years::open))
    .route("/years/{id}/closed", put(years::set_closed))
    // Students
    .route("/students", get(students::list).post(students::upsert))
    .route("/students/roster", get(students::roster))
    .route("/students/{id}", get(students::get_one).delete(students::remove))
    .route("/students/{id}/history", get(students::history))
    .route(
      "/students/{id}/enrollment",
      get(students::enrollment).put(students::enroll),
    )
    .route("/students/{id}/enrollment/status", put(students::set_status))
    // Teachers
    .route("/teachers", get(teachers::list).post(teachers::upsert))
    .route("/teachers/assigned", get(teachers::assigned))
    .route("/teachers/{id}", get(teachers::get_one).delete(teachers::remove))
    .route("/teachers/{id}/assignment", put(teachers::set_assignment))
    // Billing configuration
    .route("/classes", get(billing::classes).put(billing::set_classes))
    .route("/fees", get(billing::fees).put(billing::set_fees))
    .route("/extra-fees", get(billing::extra_fees).put(billing::set_extra_fees))
    .route("/services", get(billing::services).put(billing::set_services))
    .route("/config/copy", post(billing::copy_config))
    // Activations
    .route(
      "/activations/fees",
      get(activations::fee_keys).post(activations::toggle_fees),
    )
    .route(
      "/activations/services",
      get(activations::service_keys).post(activations::toggle_services),
    )
    // Payments
    .route("/payments", get(payments::list).post(payments::create))
    .route("/payments/summary", get(payments::summary))
    .layer(TraceLayer::new_for_http())
    .with_state(school)
}
