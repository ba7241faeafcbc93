//! Handlers for `/activations` endpoints.
//!
//! `GET` returns the year's raw activation keys. `POST` toggles one fee (or
//! one service for one month) for a batch of students in a single write.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use scolarite_core::School;
use serde::Deserialize;

use crate::{YearQuery, error::ApiError, run};

/// `GET /activations/fees`
pub async fn fee_keys(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(run(&school, move |s| s.activations().active_fee_keys(q.year())).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeToggle {
  pub student_ids: Vec<String>,
  pub fee_id:      String,
  pub active:      bool,
}

/// `POST /activations/fees`; returns the updated key set.
pub async fn toggle_fees(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
  Json(body): Json<FeeToggle>,
) -> Result<Json<Vec<String>>, ApiError> {
  if body.fee_id.is_empty() {
    return Err(ApiError::BadRequest("feeId is required".into()));
  }
  let keys = run(&school, move |s| {
    let act = s.activations();
    act.bulk_set_fee_active(&body.student_ids, &body.fee_id, body.active, q.year());
    act.active_fee_keys(q.year())
  })
  .await?;
  Ok(Json(keys))
}

/// `GET /activations/services`
pub async fn service_keys(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(run(&school, move |s| s.activations().active_service_keys(q.year())).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceToggle {
  pub student_ids: Vec<String>,
  pub service_id:  String,
  pub month:       String,
  pub active:      bool,
}

/// `POST /activations/services`; returns the updated key set.
pub async fn toggle_services(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
  Json(body): Json<ServiceToggle>,
) -> Result<Json<Vec<String>>, ApiError> {
  if body.service_id.is_empty() || body.month.is_empty() {
    return Err(ApiError::BadRequest("serviceId and month are required".into()));
  }
  let keys = run(&school, move |s| {
    let act = s.activations();
    act.bulk_set_service_active(
      &body.student_ids,
      &body.service_id,
      &body.month,
      body.active,
      q.year(),
    );
    act.active_service_keys(q.year())
  })
  .await?;
  Ok(Json(keys))
}
