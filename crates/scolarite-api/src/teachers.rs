//! Handlers for `/teachers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/teachers` | Global register |
//! | `POST`   | `/teachers` | Body: teacher; merged by id |
//! | `GET`    | `/teachers/assigned` | `?year=`; teachers assigned that year |
//! | `GET`    | `/teachers/:id` | 404 if not found |
//! | `DELETE` | `/teachers/:id` | 404 if not found |
//! | `PUT`    | `/teachers/:id/assignment` | `?year=`; body `{"assigned":true}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use scolarite_core::{School, teacher::Teacher};
use serde::Deserialize;

use crate::{YearQuery, error::ApiError, run};

fn not_found(id: &str) -> ApiError { ApiError::NotFound(format!("teacher {id} not found")) }

/// `GET /teachers`
pub async fn list(State(school): State<Arc<School>>) -> Result<Json<Vec<Teacher>>, ApiError> {
  Ok(Json(run(&school, |s| s.teachers().list()).await?))
}

/// `POST /teachers`
pub async fn upsert(
  State(school): State<Arc<School>>,
  Json(teacher): Json<Teacher>,
) -> Result<Json<Teacher>, ApiError> {
  if teacher.id.is_empty() {
    return Err(ApiError::BadRequest("teacher id is required".into()));
  }
  Ok(Json(run(&school, move |s| s.teachers().upsert(teacher)).await?))
}

/// `GET /teachers/assigned`
pub async fn assigned(
  State(school): State<Arc<School>>,
  Query(q): Query<YearQuery>,
) -> Result<Json<Vec<Teacher>>, ApiError> {
  Ok(Json(run(&school, move |s| s.teachers().assigned_teachers(q.year())).await?))
}

/// `GET /teachers/:id`
pub async fn get_one(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
) -> Result<Json<Teacher>, ApiError> {
  let key = id.clone();
  run(&school, move |s| s.teachers().get(&key))
    .await?
    .map(Json)
    .ok_or_else(|| not_found(&id))
}

/// `DELETE /teachers/:id`
pub async fn remove(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let key = id.clone();
  if run(&school, move |s| s.teachers().remove(&key)).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(&id))
  }
}

#[derive(Debug, Deserialize)]
pub struct AssignmentBody {
  pub assigned: bool,
}

/// `PUT /teachers/:id/assignment`
pub async fn set_assignment(
  State(school): State<Arc<School>>,
  Path(id): Path<String>,
  Query(q): Query<YearQuery>,
  Json(body): Json<AssignmentBody>,
) -> Result<StatusCode, ApiError> {
  let key = id.clone();
  let done = run(&school, move |s| {
    if body.assigned && s.teachers().get(&key).is_none() {
      return false;
    }
    s.teachers().set_assigned(&key, body.assigned, q.year());
    true
  })
  .await?;

  if done { Ok(StatusCode::NO_CONTENT) } else { Err(not_found(&id)) }
}
