//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals time order.
//! Setting values are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use gatepass_core::{
  profile::{Profile, Role},
  settings::Setting,
  visit::{Visit, VisitStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── VisitStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(s: VisitStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<VisitStatus> {
  match s {
    "INSIDE" => Ok(VisitStatus::Inside),
    "OUTSIDE" => Ok(VisitStatus::Outside),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "staff" => Ok(Role::Staff),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── LIKE patterns ────────────────────────────────────────────────────────────

/// `%text%` with `\`, `%` and `_` escaped for use with `ESCAPE '\'`.
pub fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawVisit::from_row`].
pub const VISIT_COLUMNS: &str = "visit_id, full_name, phone_number, purpose, \
  visiting_person, department, status, check_in_time, check_out_time, remarks";

/// Raw strings read directly from a `visits` row.
pub struct RawVisit {
  pub visit_id:        String,
  pub full_name:       String,
  pub phone_number:    String,
  pub purpose:         String,
  pub visiting_person: String,
  pub department:      String,
  pub status:          String,
  pub check_in_time:   String,
  pub check_out_time:  Option<String>,
  pub remarks:         Option<String>,
}

impl RawVisit {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit_id:        row.get(0)?,
      full_name:       row.get(1)?,
      phone_number:    row.get(2)?,
      purpose:         row.get(3)?,
      visiting_person: row.get(4)?,
      department:      row.get(5)?,
      status:          row.get(6)?,
      check_in_time:   row.get(7)?,
      check_out_time:  row.get(8)?,
      remarks:         row.get(9)?,
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      id:              decode_uuid(&self.visit_id)?,
      full_name:       self.full_name,
      phone_number:    self.phone_number,
      purpose:         self.purpose,
      visiting_person: self.visiting_person,
      department:      self.department,
      status:          decode_status(&self.status)?,
      check_in_time:   decode_dt(&self.check_in_time)?,
      check_out_time:  self.check_out_time.as_deref().map(decode_dt).transpose()?,
      remarks:         self.remarks,
    })
  }
}

pub const PROFILE_COLUMNS: &str =
  "profile_id, email, full_name, role, password_hash, created_at";

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id:    String,
  pub email:         String,
  pub full_name:     Option<String>,
  pub role:          Option<String>,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:    row.get(0)?,
      email:         row.get(1)?,
      full_name:     row.get(2)?,
      role:          row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:            decode_uuid(&self.profile_id)?,
      email:         self.email,
      full_name:     self.full_name,
      role:          self.role.as_deref().map(decode_role).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      password_hash: self.password_hash,
    })
  }
}

/// Raw strings read directly from a `settings` row.
pub struct RawSetting {
  pub setting_key:   String,
  pub category:      String,
  pub setting_value: String,
  pub updated_by:    Option<String>,
  pub updated_at:    String,
}

impl RawSetting {
  pub fn into_setting(self) -> Result<Setting> {
    Ok(Setting {
      category:   self.category,
      key:        self.setting_key,
      value:      serde_json::from_str(&self.setting_value)?,
      updated_by: self.updated_by.as_deref().map(decode_uuid).transpose()?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a), "2026-01-01T09:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }

  #[test]
  fn unknown_status_is_an_error() {
    assert!(matches!(
      decode_status("LEFT"),
      Err(Error::UnknownValue { column: "status", .. })
    ));
  }
}
