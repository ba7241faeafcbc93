//! The global student register and per-year enrollments.
//!
//! A student's identity is global and never changes; where they sit in a
//! given year lives in that year's enrollment list (`enrollments__{year}`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  SharedStore,
  clock::{Clock, timestamp},
  keys::{ENROLLMENTS, STUDENTS},
  legacy::{decode_entries, decode_list, decode_student, has_field, lenient_text},
  storage::{read, write},
  year::{YearProvider, stored_years},
};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  /// Immutable across the student's whole enrollment history.
  pub id:              String,
  pub first_name:      String,
  pub last_name:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_date:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_place:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contact:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender:          Option<String>,
  /// Class recorded on the student itself before enrollments existed.
  #[serde(rename = "classId", default, skip_serializing_if = "Option::is_none")]
  pub legacy_class_id: Option<String>,
}

impl Student {
  pub fn new(
    id: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      first_name: first_name.into(),
      last_name: last_name.into(),
      ..Self::default()
    }
  }

  /// Shallow merge: fields set in `update` win, unset optional fields keep
  /// their current value.
  pub fn merge(self, update: Student) -> Student {
    Student {
      id:              update.id,
      first_name:      update.first_name,
      last_name:       update.last_name,
      birth_date:      update.birth_date.or(self.birth_date),
      birth_place:     update.birth_place.or(self.birth_place),
      contact:         update.contact.or(self.contact),
      gender:          update.gender.or(self.gender),
      legacy_class_id: update.legacy_class_id.or(self.legacy_class_id),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
  #[default]
  Active,
  Transferred,
  Graduated,
  Left,
}

/// A student's class placement within one academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  #[serde(deserialize_with = "lenient_text")]
  pub student_id: String,
  /// Filled in from the list's year when missing.
  #[serde(default, deserialize_with = "lenient_text")]
  pub year_id:    String,
  #[serde(default, deserialize_with = "lenient_text")]
  pub class_id:   String,
  #[serde(default)]
  pub status:     EnrollmentStatus,
  /// ISO timestamp of the last placement change.
  #[serde(default)]
  pub date:       String,
}

/// A student enrolled in a given year, joined with their enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
  pub student:    Student,
  pub enrollment: Enrollment,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Students {
  store: SharedStore,
  years: Arc<dyn YearProvider>,
  clock: Arc<dyn Clock>,
}

impl Students {
  pub fn new(
    store: SharedStore,
    years: Arc<dyn YearProvider>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self { store, years, clock }
  }

  // ── Global register ───────────────────────────────────────────────────────

  /// Every registered student, decoded leniently.
  pub fn list(&self) -> Vec<Student> {
    let raw: Value = read(&*self.store, STUDENTS, Value::Null);
    decode_list(&raw, decode_student)
  }

  pub fn get(&self, id: &str) -> Option<Student> {
    self.list().into_iter().find(|s| s.id == id)
  }

  pub fn save_all(&self, students: &[Student]) {
    write(&*self.store, STUDENTS, students);
  }

  /// Insert `student`, or merge it over the existing record with the same id.
  /// Returns the stored record.
  pub fn upsert(&self, student: Student) -> Student {
    let mut list = self.list();
    let stored = match list.iter_mut().find(|s| s.id == student.id) {
      Some(existing) => {
        *existing = std::mem::take(existing).merge(student);
        existing.clone()
      }
      None => {
        list.push(student.clone());
        student
      }
    };
    self.save_all(&list);
    stored
  }

  /// Drop a student from the global register. Their enrollments are kept.
  pub fn remove(&self, id: &str) -> bool {
    let mut list = self.list();
    let before = list.len();
    list.retain(|s| s.id != id);
    if list.len() == before {
      return false;
    }
    self.save_all(&list);
    true
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  /// The year's enrollments in stored order. Records that do not decode are
  /// skipped here and kept in storage by [`Self::upsert_enrollment`].
  pub fn enrollments(&self, year: Option<&str>) -> Vec<Enrollment> {
    let year_id = self.years.resolve(year);
    let raw: Vec<Value> = read(&*self.store, &self.years.key_for(ENROLLMENTS, year), Vec::new());
    decode_entries::<Enrollment>(raw)
      .into_iter()
      .map(|mut e| {
        if e.year_id.is_empty() {
          e.year_id.clone_from(&year_id);
        }
        e
      })
      .collect()
  }

  pub fn save_enrollments(&self, enrollments: &[Enrollment], year: Option<&str>) {
    write(&*self.store, &self.years.key_for(ENROLLMENTS, year), enrollments);
  }

  pub fn enrollment_for(&self, student_id: &str, year: Option<&str>) -> Option<Enrollment> {
    self
      .enrollments(year)
      .into_iter()
      .find(|e| e.student_id == student_id)
  }

  /// Place a student in `class_id` for the year, as an active enrollment
  /// dated now. Replaces any previous placement for that year.
  pub fn enroll(&self, student_id: &str, class_id: &str, year: Option<&str>) -> Enrollment {
    self.upsert_enrollment(Enrollment {
      student_id: student_id.to_owned(),
      year_id:    self.years.resolve(year),
      class_id:   class_id.to_owned(),
      status:     EnrollmentStatus::Active,
      date:       timestamp(self.clock.now()),
    })
  }

  /// Store `enrollment` in its year, replacing the student's previous record
  /// there. An empty `year_id` means the active year.
  pub fn upsert_enrollment(&self, mut enrollment: Enrollment) -> Enrollment {
    enrollment.year_id = self.years.resolve(Some(&enrollment.year_id));
    let year = Some(enrollment.year_id.as_str());

    let value = match serde_json::to_value(&enrollment) {
      Ok(value) => value,
      Err(e) => {
        tracing::warn!(error = %e, "enrollment could not be encoded; not saved");
        return enrollment;
      }
    };

    let key = self.years.key_for(ENROLLMENTS, year);
    let mut raw: Vec<Value> = read(&*self.store, &key, Vec::new());
    match raw
      .iter_mut()
      .find(|entry| has_field(entry, "studentId", &enrollment.student_id))
    {
      Some(existing) => *existing = value,
      None => raw.push(value),
    }
    write(&*self.store, &key, &raw);
    enrollment
  }

  /// Change the status of a student's enrollment for the year. Returns the
  /// updated record, or `None` if the student is not enrolled.
  pub fn set_enrollment_status(
    &self,
    student_id: &str,
    status: EnrollmentStatus,
    year: Option<&str>,
  ) -> Option<Enrollment> {
    let mut enrollment = self.enrollment_for(student_id, year)?;
    enrollment.status = status;
    enrollment.date = timestamp(self.clock.now());
    Some(self.upsert_enrollment(enrollment))
  }

  /// Students enrolled in the year, in enrollment order. Enrollments whose
  /// student is no longer registered are skipped.
  pub fn roster(&self, year: Option<&str>) -> Vec<RosterEntry> {
    let students = self.list();
    self
      .enrollments(year)
      .into_iter()
      .filter_map(|enrollment| {
        let student = students.iter().find(|s| s.id == enrollment.student_id)?;
        Some(RosterEntry { student: student.clone(), enrollment })
      })
      .collect()
  }

  /// One enrollment per registered year the student appears in, sorted by
  /// year id. Years come from the stored registry whatever year this handle
  /// is scoped to.
  pub fn history(&self, student_id: &str) -> Vec<Enrollment> {
    let mut all: Vec<Enrollment> = stored_years(&*self.store)
      .iter()
      .filter_map(|year| self.enrollment_for(student_id, Some(&year.id)))
      .collect();
    all.sort_by(|a, b| a.year_id.cmp(&b.year_id));
    all
  }
}
