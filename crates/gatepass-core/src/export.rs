//! Downloadable JSON exports of visits and profiles.

use std::{str::FromStr, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::{
  Error, Result,
  access::{Actor, Capability},
  store::{ProfileStore, VisitQuery, VisitStore},
};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
  #[default]
  Visits,
  Profiles,
}

impl ExportKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Visits => "visits",
      Self::Profiles => "profiles",
    }
  }

  pub fn capability(&self) -> Capability {
    match self {
      Self::Visits => Capability::ExportVisits,
      Self::Profiles => Capability::ExportProfiles,
    }
  }

  /// `<type>_export_<YYYY-MM-DD>.json`
  pub fn filename(&self, date: NaiveDate) -> String {
    format!("{}_export_{}.json", self.as_str(), date.format("%Y-%m-%d"))
  }
}

impl FromStr for ExportKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "visits" => Ok(Self::Visits),
      "profiles" => Ok(Self::Profiles),
      other => Err(Error::validation("type", format!("invalid export type {other:?}"))),
    }
  }
}

/// A serialized export, ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
  pub filename:     String,
  pub content_type: &'static str,
  pub body:         String,
}

impl ExportDocument {
  pub fn build<T: Serialize>(
    kind: ExportKind,
    records: &[T],
    date: NaiveDate,
  ) -> Result<Self> {
    Ok(Self {
      filename:     kind.filename(date),
      content_type: JSON_CONTENT_TYPE,
      body:         serde_json::to_string_pretty(records)?,
    })
  }
}

/// Loads the records for an [`ExportKind`] and serializes them.
pub struct Exporter<S> {
  store: Arc<S>,
}

impl<S> Exporter<S>
where
  S: VisitStore + ProfileStore,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Build the export for `kind`, stamped with `date`.
  pub async fn export(
    &self,
    actor: &Actor,
    kind: ExportKind,
    date: NaiveDate,
  ) -> Result<ExportDocument> {
    actor.require(kind.capability())?;

    let doc = match kind {
      ExportKind::Visits => {
        let visits = self
          .store
          .query_visits(&VisitQuery::default())
          .await
          .map_err(Error::store)?;
        ExportDocument::build(kind, &visits, date)?
      }
      ExportKind::Profiles => {
        let profiles = self.store.list_profiles().await.map_err(Error::store)?;
        ExportDocument::build(kind, &profiles, date)?
      }
    };

    info!(kind = kind.as_str(), by = %actor.user_id, file = %doc.filename, "export built");
    Ok(doc)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn filename_uses_iso_date() {
    let date = NaiveDate::from_ymd_opt(2026, 10, 9).unwrap();
    assert_eq!(ExportKind::Visits.filename(date), "visits_export_2026-10-09.json");
    assert_eq!(ExportKind::Profiles.filename(date), "profiles_export_2026-10-09.json");
  }

  #[test]
  fn unknown_type_is_rejected() {
    assert_eq!("profiles".parse::<ExportKind>().unwrap(), ExportKind::Profiles);
    assert!(matches!(
      "everything".parse::<ExportKind>(),
      Err(Error::Validation { field: "type", .. })
    ));
  }

  #[test]
  fn empty_export_is_an_empty_array() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let doc = ExportDocument::build::<u8>(ExportKind::Visits, &[], date).unwrap();
    assert_eq!(doc.body, "[]");
    assert_eq!(doc.content_type, JSON_CONTENT_TYPE);
  }
}
