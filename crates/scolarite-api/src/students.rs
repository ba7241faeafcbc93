//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Global register |
//! | `POST`   | `/students` | Body: student; merged into an existing record with the same id |
//! | `GET`    | `/students/roster` | `?year=`; students enrolled that year |
//! | `GET`    | `/students/:id` | 404 if not found |
//! | `DELETE` | `/students/:id` | 404 if not found |
//! | `GET`    | `/students/:id/history` | One enrollment per registered year |
//! | `GET`    | `/students/:id/enrollment` | `?year=`; 404 if not enrolled |
//! | `PUT`    | `/students/:id/enrollment` | `?year=`; body `{"classId":..}` |
//! | `PUT`    | `/students/:id/enrollment/status` | `?year=`; body `{"status":..}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use scolarite_core::{
  School,
  student::{Enrollment, EnrollmentStatus, RosterEntry, Student},
};
use serde::Deserialize;

use crate::{YearQuery, error::ApiError, run};

fn not_found(id: &str) -> ApiError { ApiError::NotFound(format!("student {id} not found")) }

fn not_enrolled(id: &str) -> ApiError {
  ApiError::NotFound(format!("student {id} is not enrolled"))
}

/// `GET /students`
pub async fn list(State(school): State<Arc<School>>) -> Result<Json<Vec<Student>>, ApiError> {
  Ok(Json(run(&school, |s| s.students().list()).await?))
}

/// `POST /students`
pub async fn upsert(
  State(school): State<Arc<School>>,
  Json(student): Json<Student>,
) -> Result<Json<Student>, ApiError> {
  if student.id.is_empty() {
    return Err(ApiError::BadRequest("student id is required".into()));
  }
  Ok(Json(run(&school, move |s| s.students().upsert(student)).await?))
}

/// `GET /students/roster`
pub async fn roster(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
  Ok(Json(run(&school, move |s| s.students().roster(q.year())).await?))
}

/// `GET /students/:id`
pub async fn get_one(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
  let key = id.clone();
  run(&school, move |s| s.students().get(&key))
    .await?
    .map(Json)
    .ok_or_else(|| not_found(&id))
}

/// `DELETE /students/:id`
pub async fn remove(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let key = id.clone();
  if run(&school, move |s| s.students().remove(&key)).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(&id))
  }
}

/// `GET /students/:id/history`
pub async fn history(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  Ok(Json(run(&school, move |s| s.students().history(&id)).await?))
}

/// `GET /students/:id/enrollment`
pub async fn enrollment(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Enrollment>, ApiError> {
  let key = id.clone();
  run(&school, move |s| s.students().enrollment_for(&key, q.year()))
    .await?
    .map(Json)
    .ok_or_else(|| not_enrolled(&id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
  pub class_id: String,
}

/// `PUT /students/:id/enrollment`
pub async fn enroll(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
  Query(q): Query<YearQuery>,
  Json(body): Json<EnrollBody>,
) -> Result<Json<Enrollment>, ApiError> {
  let key = id.clone();
  run(&school, move |s| {
    s.students().get(&key)?;
    Some(s.students().enroll(&key, &body.class_id, q.year()))
  })
  .await?
  .map(Json)
  .ok_or_else(|| not_found(&id))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: EnrollmentStatus,
}

/// `PUT /students/:id/enrollment/status`
pub async fn set_status(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
  Query(q): Query<YearQuery>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Enrollment>, ApiError> {
  let key = id.clone();
  run(&school, move |s| s.students().set_enrollment_status(&key, body.status, q.year()))
    .await?
    .map(Json)
    .ok_or_else(|| not_enrolled(&id))
}
