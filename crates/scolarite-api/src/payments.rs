//! Handlers for `/payments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/payments` | `?year=`, optional `studentId`; ledger order |
//! | `POST` | `/payments` | `?year=`; body: new payment; 201 + stored entry |
//! | `GET`  | `/payments/summary` | `studentId` and `type` required; optional `classId`, `month`, `itemId`, `year` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use scolarite_core::{
  School,
  payment::{NewPayment, PaidSummary, PaymentFilter, PaymentKind, StudentPayment},
};
use serde::Deserialize;

use crate::{error::ApiError, run};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub year:       Option<String>,
  pub student_id: Option<String>,
}

/// `GET /payments[?year=..][&studentId=..]`
pub async fn list(
  State(school): State<Arc<School>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StudentPayment>>, ApiError> {
  let payments = run(&school, move |s| {
    let year = params.year.as_deref();
    match params.student_id.as_deref() {
      Some(id) if !id.is_empty() => s.ledger().payments_for_student(id, year),
      _ => s.ledger().payments(year),
    }
  })
  .await?;
  Ok(Json(payments))
}

#[derive(Debug, Deserialize)]
pub struct CreateParams {
  pub year: Option<String>,
}

/// `POST /payments`
pub async fn create(
  State(school): State<Arc<School>>,
  Query(params): Query<CreateParams>,
  Json(entry): Json<NewPayment>,
) -> Result<impl IntoResponse, ApiError> {
  if entry.student_id.is_empty() {
    return Err(ApiError::BadRequest("studentId is required".into()));
  }
  if !entry.amount.is_finite() || entry.amount < 0.0 {
    return Err(ApiError::BadRequest("amount must be a non-negative number".into()));
  }
  let payment =
    run(&school, move |s| s.ledger().add_payment(entry, params.year.as_deref())).await?;
  Ok((StatusCode::CREATED, Json(payment)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
  pub student_id: String,
  #[serde(rename = "type")]
  pub kind:       PaymentKind,
  pub class_id:   Option<String>,
  pub month:      Option<String>,
  pub item_id:    Option<String>,
  pub year:       Option<String>,
}

/// `GET /payments/summary?studentId=..&type=..`
pub async fn summary(
  State(school): State<Arc<School>>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<PaidSummary>, ApiError> {
  let filter = PaymentFilter {
    student_id: params.student_id,
    kind:       params.kind,
    class_id:   params.class_id,
    month:      params.month,
    item_id:    params.item_id,
  };
  let summary =
    run(&school, move |s| s.ledger().sum_paid_for(&filter, params.year.as_deref())).await?;
  Ok(Json(summary))
}
