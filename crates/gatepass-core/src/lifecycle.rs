//! The visit lifecycle: registration, checkout and read queries.
//!
//! States are `INSIDE` (initial) and `OUTSIDE` (terminal). The only transition
//! is checkout, expressed as one guarded update against the store so that two
//! concurrent checkouts of the same visit cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  access::{Actor, Capability},
  live::LiveQuery,
  store::{VisitQuery, VisitStore},
  visit::{CheckOut, NewVisit, Visit, VisitStatus, VisitorDetails},
};

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Check-in window for [`VisitManager::list_all_visits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRange {
  #[default]
  All,
  /// Since local midnight.
  Today,
  /// The last seven days.
  LastWeek,
  /// The last calendar month.
  LastMonth,
  /// Inclusive range of local calendar dates.
  Between { from: NaiveDate, to: NaiveDate },
}

impl DateRange {
  /// Resolve to `(after_inclusive, before_exclusive)` bounds in UTC.
  pub fn bounds<Tz: TimeZone>(
    &self,
    now: DateTime<Utc>,
    tz: &Tz,
  ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match *self {
      Self::All => (None, None),
      Self::Today => {
        let today = now.with_timezone(tz).date_naive();
        (Some(start_of_day(today, tz)), None)
      }
      Self::LastWeek => (Some(now - Duration::days(7)), None),
      Self::LastMonth => {
        let since = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        (Some(since), None)
      }
      Self::Between { from, to } => {
        let end = to.succ_opt().map(|d| start_of_day(d, tz));
        (Some(start_of_day(from, tz)), end)
      }
    }
  }
}

/// The UTC instant at which `date` begins in `tz`.
pub(crate) fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
  let midnight = date.and_time(NaiveTime::MIN);
  tz.from_local_datetime(&midnight)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(|| midnight.and_utc())
}

/// Parameters for [`VisitManager::list_all_visits`].
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
  pub range:  DateRange,
  /// Free-text filter over name, purpose, host and phone.
  pub text:   Option<String>,
  pub status: Option<VisitStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl VisitFilter {
  pub fn to_query<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> VisitQuery {
    let (after, before) = self.range.bounds(now, tz);
    VisitQuery {
      status:            self.status,
      checked_in_after:  after,
      checked_in_before: before,
      text:              self
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned),
      limit:             self.limit,
      offset:            self.offset,
    }
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Creates and closes visits against a [`VisitStore`].
///
/// Holds no state of its own; cloning is cheap.
pub struct VisitManager<S> {
  store: Arc<S>,
}

impl<S> Clone for VisitManager<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: VisitStore> VisitManager<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Validate `details` and persist a new `INSIDE` visit checked in now.
  pub async fn register_visit(
    &self,
    actor: &Actor,
    details: VisitorDetails,
  ) -> Result<Visit> {
    actor.require(Capability::RegisterVisit)?;
    let visitor = details.validated()?;

    let visit = self
      .store
      .insert_visit(NewVisit { visitor, check_in_time: Utc::now() })
      .await
      .map_err(Error::store)?;

    info!(visit_id = %visit.id, by = %actor.user_id, "visitor registered");
    Ok(visit)
  }

  /// Close an `INSIDE` visit. A second checkout of the same visit fails with
  /// [`Error::InvalidState`]; it is not a no-op.
  pub async fn check_out_visit(
    &self,
    actor: &Actor,
    visit_id: Uuid,
    remarks: Option<&str>,
  ) -> Result<Visit> {
    actor.require(Capability::CheckOutVisit)?;
    let checkout = CheckOut::new(Utc::now(), remarks);

    if let Some(visit) = self
      .store
      .close_visit(visit_id, checkout)
      .await
      .map_err(Error::store)?
    {
      info!(%visit_id, by = %actor.user_id, "visitor checked out");
      return Ok(visit);
    }

    // The guard matched nothing; find out why.
    match self.store.get_visit(visit_id).await.map_err(Error::store)? {
      None => Err(Error::NotFound(visit_id)),
      Some(visit) => {
        debug!(%visit_id, status = visit.status.as_str(), "checkout rejected");
        Err(Error::InvalidState(visit_id))
      }
    }
  }

  pub async fn get_visit(&self, actor: &Actor, visit_id: Uuid) -> Result<Visit> {
    actor.require(Capability::ViewVisits)?;
    self
      .store
      .get_visit(visit_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(visit_id))
  }

  /// Everyone currently inside, newest check-in first.
  pub async fn list_active_visits(&self, actor: &Actor) -> Result<Vec<Visit>> {
    actor.require(Capability::ViewVisits)?;
    self
      .store
      .query_visits(&VisitQuery::active())
      .await
      .map_err(Error::store)
  }

  /// All visits matching `filter`, newest check-in first. Date ranges are
  /// resolved against `now` in `tz`.
  pub async fn list_all_visits<Tz: TimeZone>(
    &self,
    actor: &Actor,
    filter: &VisitFilter,
    now: DateTime<Utc>,
    tz: &Tz,
  ) -> Result<Vec<Visit>> {
    actor.require(Capability::ViewVisits)?;
    let query = filter.to_query(now, tz);
    self.store.query_visits(&query).await.map_err(Error::store)
  }

  /// A feed that re-reads the active visits after every change.
  pub fn watch_active(&self, actor: &Actor) -> Result<LiveQuery<S>> {
    actor.require(Capability::ViewVisits)?;
    Ok(LiveQuery::new(Arc::clone(&self.store), VisitQuery::active()))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, TimeZone as _};

  use super::*;

  #[test]
  fn today_starts_at_local_midnight() {
    let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    // 2026-03-10 02:00 IST is still 2026-03-09 in UTC.
    let now = ist
      .with_ymd_and_hms(2026, 3, 10, 2, 0, 0)
      .unwrap()
      .with_timezone(&Utc);

    let (after, before) = DateRange::Today.bounds(now, &ist);
    assert_eq!(after, Some(Utc.with_ymd_and_hms(2026, 3, 9, 18, 30, 0).unwrap()));
    assert_eq!(before, None);
  }

  #[test]
  fn between_includes_last_day() {
    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let (after, before) = DateRange::Between { from, to }.bounds(Utc::now(), &Utc);
    assert_eq!(after, Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    assert_eq!(before, Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
  }

  #[test]
  fn blank_text_filter_is_dropped() {
    let filter = VisitFilter { text: Some("   ".into()), ..Default::default() };
    assert_eq!(filter.to_query(Utc::now(), &Utc).text, None);
  }
}
