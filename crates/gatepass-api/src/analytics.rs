//! Handler for `GET /analytics`.
//!
//! Reads every visit once and derives all dashboard figures from that single
//! snapshot, so the numbers in one response are always mutually consistent.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::Utc;
use gatepass_core::{
  access::Capability,
  lifecycle::VisitFilter,
  metrics::{
    self, DailyCount, HistoryStats, HourlyCount, PresenceStats, PurposeCount, SummaryStats,
  },
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, AppStore, auth::Authenticated, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
  /// Number of most recent active dates in `daily`.
  pub window_days: Option<usize>,
  /// Number of purposes in `purposes`.
  pub top_n:       Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Analytics {
  pub summary:  SummaryStats,
  pub presence: PresenceStats,
  pub history:  HistoryStats,
  pub daily:    Vec<DailyCount>,
  pub hourly:   Vec<HourlyCount>,
  pub purposes: Vec<PurposeCount>,
}

/// `GET /analytics[?window_days=N][&top_n=N]`
pub async fn handler<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<AnalyticsParams>,
) -> Result<Json<Analytics>, ApiError> {
  let actor = auth.actor()?;
  actor.require(Capability::ViewAnalytics)?;

  let config = &state.config;
  let tz = &config.utc_offset;
  let now = Utc::now();
  let visits = state
    .visits()
    .list_all_visits(&actor, &VisitFilter::default(), now, tz)
    .await?;

  let mut summary = metrics::summary_stats(&visits, now, tz);
  summary.average_duration_hours = metrics::round_hours(summary.average_duration_hours);
  let mut history = metrics::history_stats(&visits);
  history.average_duration_hours = metrics::round_hours(history.average_duration_hours);

  Ok(Json(Analytics {
    summary,
    presence: metrics::presence_stats(&visits, now),
    history,
    daily: metrics::daily_counts(
      &visits,
      params.window_days.unwrap_or(config.analytics_window_days),
      tz,
    ),
    hourly: metrics::hourly_distribution(&visits, tz),
    purposes: metrics::purpose_distribution(
      &visits,
      params.top_n.unwrap_or(config.analytics_top_purposes),
    ),
  }))
}
