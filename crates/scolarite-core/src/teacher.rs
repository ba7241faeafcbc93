//! The global teacher register and per-year assignment sets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  SharedStore,
  activation::dedup,
  keys::{TEACHERS, TEACHER_ASSIGNMENTS},
  legacy::{decode_list, decode_teacher, text},
  storage::{read, write},
  year::YearProvider,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
  pub id:         String,
  pub first_name: String,
  pub last_name:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject:    Option<String>,
}

impl Teacher {
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

  /// Shallow merge; see [`crate::student::Student::merge`].
  pub fn merge(self, update: Teacher) -> Teacher {
    Teacher {
      id:         update.id,
      first_name: update.first_name,
      last_name:  update.last_name,
      email:      update.email.or(self.email),
      phone:      update.phone.or(self.phone),
      subject:    update.subject.or(self.subject),
    }
  }
}

/// Teachers plus the set of teacher ids assigned to each year
/// (`teacherAssignments__{year}`).
#[derive(Clone)]
pub struct Teachers {
  store: SharedStore,
  years: Arc<dyn YearProvider>,
}

impl Teachers {
  pub fn new(store: SharedStore, years: Arc<dyn YearProvider>) -> Self {
    Self { store, years }
  }

  pub fn list(&self) -> Vec<Teacher> {
    let raw: Value = read(&*self.store, TEACHERS, Value::Null);
    decode_list(&raw, decode_teacher)
  }

  pub fn get(&self, id: &str) -> Option<Teacher> {
    self.list().into_iter().find(|t| t.id == id)
  }

  pub fn save_all(&self, teachers: &[Teacher]) {
    write(&*self.store, TEACHERS, teachers);
  }

  pub fn upsert(&self, teacher: Teacher) -> Teacher {
    let mut list = self.list();
    let stored = match list.iter_mut().find(|t| t.id == teacher.id) {
      Some(existing) => {
        *existing = std::mem::take(existing).merge(teacher);
        existing.clone()
      }
      None => {
        list.push(teacher.clone());
        teacher
      }
    };
    self.save_all(&list);
    stored
  }

  pub fn remove(&self, id: &str) -> bool {
    let mut list = self.list();
    let before = list.len();
    list.retain(|t| t.id != id);
    if list.len() == before {
      return false;
    }
    self.save_all(&list);
    true
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  /// Assigned ids for the year. Numeric ids read as text; other non-string
  /// entries are ignored.
  pub fn assigned_ids(&self, year: Option<&str>) -> Vec<String> {
    let raw: Vec<Value> = read(&*self.store, &self.assignments_key(year), Vec::new());
    dedup(raw.iter().filter_map(|v| text(Some(v))).collect())
  }

  /// Replace the year's assignment set; duplicates are dropped.
  pub fn set_assigned_ids(&self, ids: Vec<String>, year: Option<&str>) {
    write(
      &*self.store,
      &self.assignments_key(year),
      &dedup(ids),
    );
  }

  pub fn is_assigned(&self, teacher_id: &str, year: Option<&str>) -> bool {
    self.assigned_ids(year).iter().any(|id| id == teacher_id)
  }

  /// Add or drop one teacher. Other stored entries are written back as they
  /// were.
  pub fn set_assigned(&self, teacher_id: &str, assigned: bool, year: Option<&str>) -> bool {
    let key = self.assignments_key(year);
    let mut raw: Vec<Value> = read(&*self.store, &key, Vec::new());
    let is = |v: &Value| text(Some(v)).is_some_and(|id| id == teacher_id);
    if assigned {
      if !raw.iter().any(is) {
        raw.push(Value::String(teacher_id.to_owned()));
      }
    } else {
      raw.retain(|v| !is(v));
    }
    write(&*self.store, &key, &raw);
    assigned
  }

  /// Registered teachers assigned to the year, in assignment order.
  pub fn assigned_teachers(&self, year: Option<&str>) -> Vec<Teacher> {
    let teachers = self.list();
    self
      .assigned_ids(year)
      .iter()
      .filter_map(|id| teachers.iter().find(|t| &t.id == id).cloned())
      .collect()
  }

  fn assignments_key(&self, year: Option<&str>) -> String {
    self.years.key_for(TEACHER_ASSIGNMENTS, year)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{KeyValueStore, MemoryStore, year::FixedYear};

  fn teachers(store: &Arc<MemoryStore>) -> Teachers {
    Teachers::new(store.clone(), Arc::new(FixedYear("2025-2026".into())))
  }

  #[test]
  fn upsert_merges_optional_fields() {
    let store = Arc::new(MemoryStore::new());
    let reg = teachers(&store);

    let mut t = Teacher::new("t1", "Fatou", "Sow");
    t.subject = Some("Maths".into());
    reg.upsert(t);
    let merged = reg.upsert(Teacher::new("t1", "Fatou", "Sow-Ba"));

    assert_eq!(merged.subject.as_deref(), Some("Maths"));
    assert_eq!(reg.list().len(), 1);
    assert_eq!(reg.get("t1").unwrap().last_name, "Sow-Ba");
  }

  #[test]
  fn assignment_toggle_is_a_set() {
    let store = Arc::new(MemoryStore::new());
    let reg = teachers(&store);

    reg.set_assigned("t1", true, None);
    reg.set_assigned("t1", true, None);
    reg.set_assigned("t2", true, None);
    assert_eq!(reg.assigned_ids(None), ["t1", "t2"]);
    assert!(reg.is_assigned("t1", None));

    reg.set_assigned("t1", false, None);
    assert_eq!(reg.assigned_ids(None), ["t2"]);
    assert!(!reg.is_assigned("t1", None));
    assert_eq!(
      store.get("teacherAssignments__2025-2026").unwrap().as_deref(),
      Some("[\"t2\"]")
    );
  }

  #[test]
  fn set_assigned_ids_deduplicates() {
    let store = Arc::new(MemoryStore::new());
    let reg = teachers(&store);
    reg.set_assigned_ids(vec!["a".into(), "b".into(), "a".into()], Some("2024-2025"));
    assert_eq!(reg.assigned_ids(Some("2024-2025")), ["a", "b"]);
    assert!(reg.assigned_ids(None).is_empty());
  }

  #[test]
  fn assigned_teachers_joins_register() {
    let store = Arc::new(MemoryStore::new());
    let reg = teachers(&store);
    reg.upsert(Teacher::new("t1", "Fatou", "Sow"));
    reg.set_assigned("t1", true, None);
    reg.set_assigned("gone", true, None);

    let assigned = reg.assigned_teachers(None);
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].first_name, "Fatou");
  }

  #[test]
  fn numeric_assignment_ids_survive_toggles() {
    let store = Arc::new(MemoryStore::from_pairs([(
      "teacherAssignments__2025-2026",
      r#"["t1",7,{"odd":true}]"#,
    )]));
    let reg = teachers(&store);
    assert_eq!(reg.assigned_ids(None), ["t1", "7"]);
    assert!(reg.is_assigned("7", None));

    reg.set_assigned("t2", true, None);
    reg.set_assigned("7", true, None);
    assert_eq!(reg.assigned_ids(None), ["t1", "7", "t2"]);
    assert_eq!(
      store.get("teacherAssignments__2025-2026").unwrap().as_deref(),
      Some(r#"["t1",7,{"odd":true},"t2"]"#)
    );

    reg.set_assigned("7", false, None);
    assert_eq!(reg.assigned_ids(None), ["t1", "t2"]);
  }
}
