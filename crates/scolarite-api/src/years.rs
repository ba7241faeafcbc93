//! Handlers for `/years` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/years` | Registry order |
//! | `POST` | `/years` | Body: partial year; empty fields take today's defaults; 201 |
//! | `GET`  | `/years/active` | Creates the default year on an empty registry |
//! | `PUT`  | `/years/active` | Body: `{"id":"2024-2025"}`; 404 if unknown |
//! | `PUT`  | `/years/:id/closed` | Body: `{"closed":true}` |
//! | `POST` | `/years/clone` | Body: `{"from":..,"to":..}`; returns a clone report |
//! | `POST` | `/years/open` | Body: `{"year":{..},"from":..}`; add, clone, activate |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use scolarite_core::{
  School,
  clone::CloneReport,
  year::{AcademicYear, YearDraft},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, run};

/// `GET /years`
pub async fn list(State(school): State<Arc<School>>) -> Result<Json<Vec<AcademicYear>>, ApiError> {
  Ok(Json(run(&school, |s| s.years().list_years()).await?))
}

/// `POST /years`
pub async fn create(
  State(school): State<Arc<School>>,
  Json(draft): Json<YearDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let year = run(&school, move |s| s.years().add_year(draft)).await?;
  Ok((StatusCode::CREATED, Json(year)))
}

/// `GET /years/active`
pub async fn active(State(school): State<Arc<School>>) -> Result<Json<AcademicYear>, ApiError> {
  run(&school, |s| s.years().active_year())
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("no active year".into()))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
  pub id: String,
}

/// `PUT /years/active`
pub async fn set_active(
  State(school): State<Arc<School>>,
  Json(body): Json<SetActiveBody>,
) -> Result<Json<AcademicYear>, ApiError> {
  let id = body.id;
  run(&school, move |s| {
    let year = s.years().list_years().into_iter().find(|y| y.id == id);
    match year {
      Some(year) => {
        s.years().set_active_year(&year.id);
        Ok(Json(year))
      }
      None => Err(ApiError::NotFound(format!("year {id} not found"))),
    }
  })
  .await?
}

#[derive(Debug, Deserialize)]
pub struct ClosedBody {
  pub closed: bool,
}

/// `PUT /years/:id/closed`
pub async fn set_closed(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
  Json(body): Json<ClosedBody>,
) -> Result<StatusCode, ApiError> {
  let closed = body.closed;
  let key = id.clone();
  if run(&school, move |s| s.years().set_year_closed(&key, closed)).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("year {id} not found")))
  }
}

#[derive(Debug, Deserialize)]
pub struct CloneBody {
  pub from: String,
  pub to:   String,
}

/// `POST /years/clone`
pub async fn clone_data(
  State(school): State<Arc<School>>,
  Json(body): Json<CloneBody>,
) -> Result<Json<CloneReport>, ApiError> {
  let report = run(&school, move |s| s.clone_year_data(&body.from, &body.to)).await?;
  Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct OpenBody {
  #[serde(default)]
  pub year: YearDraft,
  pub from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Opened {
  pub year:   AcademicYear,
  pub report: CloneReport,
}

/// `POST /years/open`
pub async fn open(
  State(school): State<Arc<School>>,
  Json(body): Json<OpenBody>,
) -> Result<impl IntoResponse, ApiError> {
  let (year, report) =
    run(&school, move |s| s.open_new_year(body.year, body.from.as_deref())).await?;
  Ok((StatusCode::CREATED, Json(Opened { year, report })))
}
