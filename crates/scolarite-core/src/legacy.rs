//! Decoders for roster records written by older versions of the app.
//!
//! Early data used French field names (`prenom`, `nom`) and numeric ids. The
//! functions here map any JSON value onto the current structs and never
//! fail: unknown shapes and missing fields decode to empty strings.
//!
//! The `lenient_*` functions are `deserialize_with` hooks for the same rules
//! on serde-derived records.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::{billing::Classe, student::Student, teacher::Teacher};

/// Decode a student record. Name synonyms are tried while the previous one is
/// absent or `null`, so an explicit empty `firstName` wins over `prenom`.
pub fn decode_student(value: &Value) -> Student {
  Student {
    id:              text(value.get("id")).unwrap_or_default(),
    first_name:      first_present(value, &["firstName", "prenom"]),
    last_name:       first_present(value, &["lastName", "nom"]),
    birth_date:      text(value.get("birthDate")),
    birth_place:     text(value.get("birthPlace")),
    contact:         text(value.get("contact")),
    gender:          text(value.get("gender")),
    legacy_class_id: text(value.get("classId")),
  }
}

/// Decode a teacher record. Unlike students, empty names also fall through
/// to the next synonym.
pub fn decode_teacher(value: &Value) -> Teacher {
  Teacher {
    id:         text(value.get("id")).unwrap_or_default(),
    first_name: first_non_empty(value, &["firstName", "prenom"]),
    last_name:  first_non_empty(value, &["lastName", "nom"]),
    email:      text(value.get("email")),
    phone:      text(value.get("phone")),
    subject:    text(value.get("subject")),
  }
}

/// Decode a class, or `None` when it lacks an id or a name.
pub fn decode_class(value: &Value) -> Option<Classe> {
  let id = text(value.get("id")).unwrap_or_default();
  let name = first_non_empty(value, &["name", "nom"]);
  (!id.is_empty() && !name.is_empty()).then_some(Classe { id, name })
}

/// Decode every element of a stored list; a non-array decodes as empty.
pub fn decode_list<T>(value: &Value, decode: impl Fn(&Value) -> T) -> Vec<T> {
  value
    .as_array()
    .map(|items| items.iter().map(decode).collect())
    .unwrap_or_default()
}

/// Decode each element of a raw stored list, skipping the ones that do not
/// fit `T`. The raw list itself is left for the caller to write back.
pub fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>) -> Vec<T> {
  entries
    .into_iter()
    .filter_map(|entry| match serde_json::from_value(entry) {
      Ok(decoded) => Some(decoded),
      Err(e) => {
        tracing::debug!(error = %e, "skipping undecodable entry");
        None
      }
    })
    .collect()
}

/// `true` when `entry[field]` renders as `id`, so `7` matches `"7"`.
pub(crate) fn has_field(entry: &Value, field: &str, id: &str) -> bool {
  text(entry.get(field)).is_some_and(|v| v == id)
}

/// Scalars as text; anything else as an empty string.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(text(Some(&Value::deserialize(deserializer)?)).unwrap_or_default())
}

/// Numbers pass through, numeric strings are parsed, anything else
/// (including non-finite results) counts as zero.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let amount = match Value::deserialize(deserializer)? {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => s.trim().parse().unwrap_or(0.0),
    Value::Bool(true) => 1.0,
    _ => 0.0,
  };
  Ok(if amount.is_finite() { amount } else { 0.0 })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Scalar values rendered as text; `null`, arrays and objects are absent.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn first_present(value: &Value, names: &[&str]) -> String {
  names
    .iter()
    .find_map(|name| text(value.get(*name)))
    .unwrap_or_default()
}

fn first_non_empty(value: &Value, names: &[&str]) -> String {
  names
    .iter()
    .filter_map(|name| text(value.get(*name)))
    .find(|s| !s.is_empty() && s != "0" && s != "false")
    .unwrap_or_default()
}
