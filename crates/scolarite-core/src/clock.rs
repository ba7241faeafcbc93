//! Time sources.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// The calendar date used for academic-year arithmetic.
  fn today(&self) -> NaiveDate { self.now().date_naive() }
}

/// Wall-clock time; `today` follows the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }

  fn today(&self) -> NaiveDate { Local::now().date_naive() }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
  /// Midnight UTC on `date`.
  pub fn on(date: NaiveDate) -> Self { Self(date.and_time(chrono::NaiveTime::MIN).and_utc()) }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { self.0 }
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix, the format
/// stored in `date` fields.
pub fn timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
