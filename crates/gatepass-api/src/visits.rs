//! Handlers for `/visits` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/visits` | `?range=all\|today\|week\|month\|custom&from&to&text&status&limit&offset` |
//! | `POST` | `/visits` | Body: the five visitor fields; 201 on success |
//! | `GET`  | `/visits/active` | Everyone currently inside |
//! | `GET`  | `/visits/stream` | SSE: a fresh `active_visits` snapshot after every change |
//! | `GET`  | `/visits/{id}` | 404 if not found |
//! | `POST` | `/visits/{id}/checkout` | Optional body `{"remarks":"..."}`; 409 if already out |

use std::{convert::Infallible, time::Duration};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
  },
};
use chrono::{NaiveDate, Utc};
use futures::{
  Stream, StreamExt as _, future,
  stream::{once, unfold},
};
use gatepass_core::{
  Error as CoreError,
  lifecycle::{DateRange, VisitFilter},
  visit::{Visit, VisitStatus, VisitorDetails},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::{ApiState, AppStore, auth::Authenticated, body::JsonBody, error::ApiError};

/// SSE event name carrying a JSON array of active visits.
pub const SNAPSHOT_EVENT: &str = "active_visits";

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeParam {
  #[default]
  All,
  Today,
  Week,
  Month,
  Custom,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub range:  Option<RangeParam>,
  /// First local date of a `custom` range.
  pub from:   Option<NaiveDate>,
  /// Last local date (inclusive) of a `custom` range.
  pub to:     Option<NaiveDate>,
  pub text:   Option<String>,
  pub status: Option<VisitStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl ListParams {
  /// Giving `from`/`to` without a `range` implies `custom`.
  pub fn into_filter(self) -> Result<VisitFilter, CoreError> {
    let range = match self.range {
      Some(r) => r,
      None if self.from.is_some() || self.to.is_some() => RangeParam::Custom,
      None => RangeParam::All,
    };

    let range = match range {
      RangeParam::All => DateRange::All,
      RangeParam::Today => DateRange::Today,
      RangeParam::Week => DateRange::LastWeek,
      RangeParam::Month => DateRange::LastMonth,
      RangeParam::Custom => {
        let from = self.from.ok_or_else(|| CoreError::validation("from", "is required"))?;
        let to = self.to.ok_or_else(|| CoreError::validation("to", "is required"))?;
        if from > to {
          return Err(CoreError::validation("to", "must not be before from"));
        }
        DateRange::Between { from, to }
      }
    };

    Ok(VisitFilter {
      range,
      text: self.text,
      status: self.status,
      limit: self.limit,
      offset: self.offset,
    })
  }
}

/// `GET /visits`
pub async fn list<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Visit>>, ApiError> {
  let actor = auth.actor()?;
  let filter = params.into_filter()?;
  let visits = state
    .visits()
    .list_all_visits(&actor, &filter, Utc::now(), &state.config.utc_offset)
    .await?;
  Ok(Json(visits))
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /visits`
pub async fn create<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  JsonBody(details): JsonBody<VisitorDetails>,
) -> Result<impl IntoResponse, ApiError> {
  let actor = auth.actor()?;
  let visit = state.visits().register_visit(&actor, details).await?;
  Ok((StatusCode::CREATED, Json(visit)))
}

// ─── Active ───────────────────────────────────────────────────────────────────

/// `GET /visits/active`
pub async fn active<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<Visit>>, ApiError> {
  let actor = auth.actor()?;
  Ok(Json(state.visits().list_active_visits(&actor).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /visits/{id}`
pub async fn get_one<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Visit>, ApiError> {
  let actor = auth.actor()?;
  Ok(Json(state.visits().get_visit(&actor, id).await?))
}

// ─── Checkout ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutBody {
  #[serde(default)]
  pub remarks: Option<String>,
}

/// `POST /visits/{id}/checkout`
pub async fn checkout<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  body: Option<JsonBody<CheckoutBody>>,
) -> Result<Json<Visit>, ApiError> {
  let actor = auth.actor()?;
  let remarks = body.and_then(|JsonBody(b)| b.remarks);
  let visit = state
    .visits()
    .check_out_visit(&actor, id, remarks.as_deref())
    .await?;
  Ok(Json(visit))
}

// ─── Stream ───────────────────────────────────────────────────────────────────

fn snapshot_event(snapshot: Result<Vec<Visit>, CoreError>) -> Event {
  match snapshot {
    Ok(visits) => Event::default()
      .event(SNAPSHOT_EVENT)
      .json_data(&visits)
      .unwrap_or_else(|_| Event::default().event("error").data("serialization_error")),
    Err(e) => {
      warn!(error = %e, "live snapshot failed");
      Event::default().event("error").data(ApiError::from(e).public_message())
    }
  }
}

/// `GET /visits/stream`
///
/// Sends the current active list immediately, then a new snapshot each time
/// the visits table changes.
pub async fn stream<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
  let actor = auth.actor()?;
  let live = state.visits().watch_active(&actor)?;
  let initial = live.refresh().await?;

  let updates = unfold(live, |mut live| async move {
    let snapshot = live.next().await?;
    Some((snapshot, live))
  });

  let events = once(future::ready(Ok(initial)))
    .chain(updates)
    .map(|snapshot| Ok(snapshot_event(snapshot)));

  Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEPALIVE_INTERVAL).text("keepalive")))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2026, 5, d).unwrap() }

  #[test]
  fn dates_without_range_mean_custom() {
    let params = ListParams { from: Some(date(1)), to: Some(date(3)), ..Default::default() };
    let filter = params.into_filter().unwrap();
    assert_eq!(filter.range, DateRange::Between { from: date(1), to: date(3) });
  }

  #[test]
  fn custom_range_needs_both_ends_in_order() {
    let missing = ListParams { range: Some(RangeParam::Custom), ..Default::default() };
    assert!(matches!(
      missing.into_filter(),
      Err(CoreError::Validation { field: "from", .. })
    ));

    let reversed = ListParams { from: Some(date(5)), to: Some(date(2)), ..Default::default() };
    assert!(matches!(
      reversed.into_filter(),
      Err(CoreError::Validation { field: "to", .. })
    ));
  }

  #[test]
  fn named_ranges_map_directly() {
    let params = ListParams { range: Some(RangeParam::Week), ..Default::default() };
    assert_eq!(params.into_filter().unwrap().range, DateRange::LastWeek);
  }
}
