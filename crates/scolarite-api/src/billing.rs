//! Handlers for billing configuration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`/`PUT` | `/classes` | Global |
//! | `GET`/`PUT` | `/fees` | `?year=`; map of class id to fee schedule |
//! | `GET`/`PUT` | `/extra-fees` | `?year=` |
//! | `GET`/`PUT` | `/services` | `?year=` |
//! | `POST` | `/config/copy` | Body `{"from":..,"to":..}`; reports copied parts |
//!
//! `PUT` replaces the whole collection and returns 204.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use scolarite_core::{
  School,
  billing::{Classe, ConfigCopy, ExtraFee, FeesMap, Service},
};
use serde::Deserialize;

use crate::{YearQuery, error::ApiError, run};

/// `GET /classes`
pub async fn classes(State(school): State<Arc<School>>) -> Result<Json<Vec<Classe>>, ApiError> {
  Ok(Json(run(&school, |s| s.billing().classes()).await?))
}

/// `PUT /classes`
pub async fn set_classes(
  State(school): State<Arc<School>>,
  Json(classes): Json<Vec<Classe>>,
) -> Result<StatusCode, ApiError> {
  if classes.iter().any(|c| c.id.is_empty() || c.name.is_empty()) {
    return Err(ApiError::BadRequest("every class needs an id and a name".into()));
  }
  run(&school, move |s| s.billing().set_classes(&classes)).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /fees`
pub async fn fees(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<FeesMap>, ApiError> {
  Ok(Json(run(&school, move |s| s.billing().fees_map(q.year())).await?))
}

/// `PUT /fees`
pub async fn set_fees(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
  Json(fees): Json<FeesMap>,
) -> Result<StatusCode, ApiError> {
  run(&school, move |s| s.billing().set_fees_map(&fees, q.year())).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /extra-fees`
pub async fn extra_fees(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<ExtraFee>>, ApiError> {
  Ok(Json(run(&school, move |s| s.billing().extra_fees(q.year())).await?))
}

/// `PUT /extra-fees`
pub async fn set_extra_fees(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
  Json(fees): Json<Vec<ExtraFee>>,
) -> Result<StatusCode, ApiError> {
  run(&school, move |s| s.billing().set_extra_fees(&fees, q.year())).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /services`
pub async fn services(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
  Ok(Json(run(&school, move |s| s.billing().services(q.year())).await?))
}

/// `PUT /services`
pub async fn set_services(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
  Json(services): Json<Vec<Service>>,
) -> Result<StatusCode, ApiError> {
  run(&school, move |s| s.billing().set_services(&services, q.year())).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CopyBody {
  pub from: String,
  pub to:   String,
}

/// `POST /config/copy`
pub async fn copy_config(
  State(school): State<Arc<School>>,
  Json(body): Json<CopyBody>,
) -> Result<Json<ConfigCopy>, ApiError> {
  if body.from.is_empty() || body.to.is_empty() {
    return Err(ApiError::BadRequest("both `from` and `to` are required".into()));
  }
  let copy = run(&school, move |s| s.billing().copy_year_config(&body.from, &body.to)).await?;
  Ok(Json(copy))
}
