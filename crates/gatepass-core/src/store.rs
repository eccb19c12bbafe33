//! The store collaborator traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `gatepass-store-sqlite`). Higher layers (`gatepass-api`, the lifecycle
//! manager) depend on these abstractions, not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  profile::{NewProfile, Profile},
  settings::Setting,
  visit::{CheckOut, NewVisit, Visit, VisitChange, VisitStatus},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`VisitStore::query_visits`]. Results are always ordered by
/// `check_in_time`, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitQuery {
  pub status:            Option<VisitStatus>,
  /// Inclusive lower bound on `check_in_time`.
  pub checked_in_after:  Option<DateTime<Utc>>,
  /// Exclusive upper bound on `check_in_time`.
  pub checked_in_before: Option<DateTime<Utc>>,
  /// Free-text filter; see [`Visit::matches_text`].
  pub text:              Option<String>,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

impl VisitQuery {
  /// Everyone currently on the premises.
  pub fn active() -> Self {
    Self { status: Some(VisitStatus::Inside), ..Default::default() }
  }

  /// Whether `visit` passes every filter (ignores `limit`/`offset`).
  pub fn matches(&self, visit: &Visit) -> bool {
    self.status.is_none_or(|s| visit.status == s)
      && self.checked_in_after.is_none_or(|t| visit.check_in_time >= t)
      && self.checked_in_before.is_none_or(|t| visit.check_in_time < t)
      && self.text.as_deref().is_none_or(|t| visit.matches_text(t))
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for a backend implementing several store traits.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Persistence and change notification for visits.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait VisitStore: Store {
  /// Persist a new `INSIDE` visit and return it with its assigned id.
  fn insert_visit(
    &self,
    input: NewVisit,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  /// Retrieve a visit by id. Returns `None` if not found.
  fn get_visit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// Apply the checkout transition as one conditional update guarded on
  /// `status = INSIDE`.
  ///
  /// Returns the updated visit, or `None` if the guard matched nothing (the
  /// visit is missing or already outside). The stored `check_out_time` is
  /// never earlier than `check_in_time`.
  fn close_visit(
    &self,
    id: Uuid,
    checkout: CheckOut,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// Return visits matching `query`, newest check-in first.
  fn query_visits<'a>(
    &'a self,
    query: &'a VisitQuery,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + 'a;

  /// Subscribe to change notifications for the visits table.
  fn subscribe(&self) -> broadcast::Receiver<VisitChange>;
}

/// Identity and role lookup.
pub trait ProfileStore: Store {
  /// Returns an error if the email is already taken.
  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by login email.
  fn find_profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  fn list_profiles(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;
}

/// Key/value settings grouped by category.
pub trait SettingsStore: Store {
  /// All settings, ordered by category then key.
  fn list_settings(
    &self,
  ) -> impl Future<Output = Result<Vec<Setting>, Self::Error>> + Send + '_;

  /// Overwrite the value of every existing key in `updates`; unknown keys are
  /// skipped. Returns the number of settings updated.
  fn update_settings(
    &self,
    updates: BTreeMap<String, serde_json::Value>,
    updated_by: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
