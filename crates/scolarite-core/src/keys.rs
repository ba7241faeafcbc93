//! Storage key names and year namespacing.
//!
//! The names below are a persisted contract: renaming one orphans existing
//! data, and year cloning relies on every year-scoped key following
//! `{base}__{yearId}`.

// ─── Global keys ─────────────────────────────────────────────────────────────

pub const ACADEMIC_YEARS: &str = "academicYears";
pub const ACTIVE_YEAR_ID: &str = "activeYearId";
pub const STUDENTS: &str = "students";
pub const TEACHERS: &str = "teachers";
pub const CLASSES: &str = "classes";

// ─── Year-scoped base keys ───────────────────────────────────────────────────

pub const ENROLLMENTS: &str = "enrollments";
pub const TEACHER_ASSIGNMENTS: &str = "teacherAssignments";
/// Also read un-namespaced as a legacy fallback.
pub const STUDENT_FEES: &str = "studentFees";
/// Also read un-namespaced as a legacy fallback.
pub const EXTRA_FEES: &str = "studentsExtraFees";
/// Also read un-namespaced as a legacy fallback.
pub const SERVICES: &str = "studentsServices";
pub const FEE_ACTIVATIONS: &str = "studentsFeeActivations";
pub const SERVICE_ACTIVATIONS: &str = "studentsServiceActivations";
/// Also read un-namespaced as a legacy fallback.
pub const PAYMENTS: &str = "studentPayments";

/// Year-scoped rosters that start empty in a freshly cloned year.
pub const ROSTERS: [&str; 2] = [ENROLLMENTS, TEACHER_ASSIGNMENTS];

const SEPARATOR: &str = "__";

// ─── Namespacing ─────────────────────────────────────────────────────────────

/// `"{base}__{year_id}"`.
pub fn key_for_year(base: &str, year_id: &str) -> String {
  format!("{base}{SEPARATOR}{year_id}")
}

/// The suffix every key of `year_id` ends with.
pub fn year_suffix(year_id: &str) -> String { format!("{SEPARATOR}{year_id}") }

/// Inverse of [`key_for_year`]: the base key if `key` belongs to `year_id`.
pub fn base_key_for<'k>(key: &'k str, year_id: &str) -> Option<&'k str> {
  key.strip_suffix(year_suffix(year_id).as_str())
}
