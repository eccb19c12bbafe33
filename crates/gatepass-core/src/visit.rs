//! Visit types. One record per person on the premises.
//!
//! A visit is created `INSIDE` at registration and closed exactly once at
//! checkout. The visitor-supplied fields never change after creation; the
//! checkout transition is the only mutation a visit ever sees.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Stored in place of blank checkout remarks.
pub const DEFAULT_REMARKS: &str = "No remarks";

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where the visitor currently is. `Inside` is initial, `Outside` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisitStatus {
  Inside,
  Outside,
}

impl VisitStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Inside => "INSIDE",
      Self::Outside => "OUTSIDE",
    }
  }

  pub fn is_terminal(&self) -> bool { matches!(self, Self::Outside) }
}

// ─── Registration input ──────────────────────────────────────────────────────

/// The five fields a visitor supplies at the front desk.
/// Missing fields deserialize as empty and are caught by
/// [`VisitorDetails::validated`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorDetails {
  pub full_name:       String,
  pub phone_number:    String,
  pub purpose:         String,
  pub visiting_person: String,
  pub department:      String,
}

impl VisitorDetails {
  /// Trim every field and reject the first one left empty.
  pub fn validated(self) -> Result<Self> {
    let details = Self {
      full_name:       self.full_name.trim().to_owned(),
      phone_number:    self.phone_number.trim().to_owned(),
      purpose:         self.purpose.trim().to_owned(),
      visiting_person: self.visiting_person.trim().to_owned(),
      department:      self.department.trim().to_owned(),
    };

    let fields = [
      ("full_name", &details.full_name),
      ("phone_number", &details.phone_number),
      ("purpose", &details.purpose),
      ("visiting_person", &details.visiting_person),
      ("department", &details.department),
    ];
    if let Some((field, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
      return Err(Error::validation(*field, "is required"));
    }

    Ok(details)
  }
}

/// Input to [`crate::store::VisitStore::insert_visit`]. The id is assigned by
/// the store; the status is always `Inside`.
#[derive(Debug, Clone)]
pub struct NewVisit {
  pub visitor:       VisitorDetails,
  pub check_in_time: DateTime<Utc>,
}

// ─── Checkout input ──────────────────────────────────────────────────────────

/// The field values written by the single INSIDE → OUTSIDE transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOut {
  pub at:      DateTime<Utc>,
  pub remarks: String,
}

impl CheckOut {
  pub fn new(at: DateTime<Utc>, remarks: Option<&str>) -> Self {
    Self { at, remarks: normalize_remarks(remarks) }
  }
}

/// Trimmed remarks, or [`DEFAULT_REMARKS`] when absent or blank.
pub fn normalize_remarks(remarks: Option<&str>) -> String {
  match remarks.map(str::trim) {
    Some(r) if !r.is_empty() => r.to_owned(),
    _ => DEFAULT_REMARKS.to_owned(),
  }
}

// ─── Visit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
  pub id:              Uuid,
  pub full_name:       String,
  pub phone_number:    String,
  pub purpose:         String,
  pub visiting_person: String,
  pub department:      String,
  pub status:          VisitStatus,
  pub check_in_time:   DateTime<Utc>,
  /// Set if and only if `status` is `Outside`.
  pub check_out_time:  Option<DateTime<Utc>>,
  pub remarks:         Option<String>,
}

impl Visit {
  /// Build the record a store persists for `input` under `id`.
  pub fn from_new(id: Uuid, input: NewVisit) -> Self {
    let v = input.visitor;
    Self {
      id,
      full_name: v.full_name,
      phone_number: v.phone_number,
      purpose: v.purpose,
      visiting_person: v.visiting_person,
      department: v.department,
      status: VisitStatus::Inside,
      check_in_time: input.check_in_time,
      check_out_time: None,
      remarks: None,
    }
  }

  pub fn is_inside(&self) -> bool { self.status == VisitStatus::Inside }

  /// Apply the checkout transition in memory. Returns `false` (and leaves the
  /// visit untouched) if it is already outside.
  pub fn close(&mut self, checkout: &CheckOut) -> bool {
    if !self.is_inside() {
      return false;
    }
    self.status = VisitStatus::Outside;
    self.check_out_time = Some(checkout.at.max(self.check_in_time));
    self.remarks = Some(checkout.remarks.clone());
    true
  }

  /// Time spent on the premises, for completed visits only.
  pub fn duration(&self) -> Option<Duration> {
    self.check_out_time.map(|out| out - self.check_in_time)
  }

  /// Case-insensitive substring match over name, purpose and host; the phone
  /// number is matched verbatim.
  pub fn matches_text(&self, needle: &str) -> bool {
    let lowered = needle.to_lowercase();
    self.full_name.to_lowercase().contains(&lowered)
      || self.purpose.to_lowercase().contains(&lowered)
      || self.visiting_person.to_lowercase().contains(&lowered)
      || self.phone_number.contains(needle)
  }
}

// ─── Change notification ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  Inserted,
  Updated,
}

/// Broadcast by a store after every successful write to the visits table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitChange {
  pub kind:     ChangeKind,
  pub visit_id: Uuid,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn details() -> VisitorDetails {
    VisitorDetails {
      full_name:       "  Asha Rao ".into(),
      phone_number:    "9998887777".into(),
      purpose:         "Interview".into(),
      visiting_person: "Dr. Iyer".into(),
      department:      "Administration".into(),
    }
  }

  #[test]
  fn validated_trims_fields() {
    let d = details().validated().unwrap();
    assert_eq!(d.full_name, "Asha Rao");
  }

  #[test]
  fn validated_names_first_blank_field() {
    let mut d = details();
    d.purpose = "   ".into();
    d.department = String::new();
    let err = d.validated().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "purpose", .. }));
  }

  #[test]
  fn blank_remarks_become_default() {
    assert_eq!(normalize_remarks(None), DEFAULT_REMARKS);
    assert_eq!(normalize_remarks(Some("  \t")), DEFAULT_REMARKS);
    assert_eq!(normalize_remarks(Some(" left early ")), "left early");
  }

  #[test]
  fn close_never_precedes_check_in() {
    let now = Utc::now();
    let mut visit = Visit::from_new(Uuid::new_v4(), NewVisit {
      visitor:       details(),
      check_in_time: now,
    });

    let skewed = CheckOut::new(now - Duration::seconds(5), None);
    assert!(visit.close(&skewed));
    assert_eq!(visit.check_out_time, Some(now));
    assert!(!visit.close(&skewed));
  }

  #[test]
  fn text_match_is_case_insensitive_except_phone() {
    let visit = Visit::from_new(Uuid::new_v4(), NewVisit {
      visitor:       details().validated().unwrap(),
      check_in_time: Utc::now(),
    });
    assert!(visit.matches_text("asha"));
    assert!(visit.matches_text("IYER"));
    assert!(visit.matches_text("888"));
    assert!(!visit.matches_text("finance"));
  }
}
