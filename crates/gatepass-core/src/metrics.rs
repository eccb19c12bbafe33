//! Derived statistics over a snapshot of visits.
//!
//! Every function here is pure: no I/O, no clock reads (callers pass `now`),
//! and an empty input is always a valid, zero-valued result. "Local" dates and
//! hours are taken in the caller-supplied time zone.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::visit::Visit;

/// Label for visits whose purpose is blank.
pub const UNKNOWN_PURPOSE: &str = "Unknown";

const SECONDS_PER_HOUR: f64 = 3600.0;

// ─── Result types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
  pub date:  NaiveDate,
  pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
  pub hour:  u32,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurposeCount {
  pub purpose: String,
  pub count:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
  pub total:                  usize,
  pub inside:                 usize,
  pub today:                  usize,
  pub average_duration_hours: f64,
}

/// Front-desk view of who is currently inside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceStats {
  pub total:     usize,
  /// Checked in less than an hour ago.
  pub recent:    usize,
  /// Inside for more than four hours.
  pub long_stay: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
  pub total:                  usize,
  pub completed:              usize,
  pub active:                 usize,
  pub average_duration_hours: f64,
}

// ─── Aggregations ────────────────────────────────────────────────────────────

/// Visit counts per local check-in date, oldest first, limited to the most
/// recent `window_days` dates that have any visits.
pub fn daily_counts<Tz: TimeZone>(
  visits: &[Visit],
  window_days: usize,
  tz: &Tz,
) -> Vec<DailyCount> {
  let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
  for v in visits {
    *by_date.entry(v.check_in_time.with_timezone(tz).date_naive()).or_default() += 1;
  }

  let skip = by_date.len().saturating_sub(window_days);
  by_date
    .into_iter()
    .skip(skip)
    .map(|(date, count)| DailyCount { date, count })
    .collect()
}

/// Exactly 24 buckets, one per local hour of check-in.
pub fn hourly_distribution<Tz: TimeZone>(visits: &[Visit], tz: &Tz) -> Vec<HourlyCount> {
  let mut buckets = [0usize; 24];
  for v in visits {
    buckets[v.check_in_time.with_timezone(tz).hour() as usize] += 1;
  }

  buckets
    .into_iter()
    .zip(0u32..)
    .map(|(count, hour)| HourlyCount { hour, count })
    .collect()
}

/// The `top_n` most common purposes, most frequent first. Ties keep the order
/// in which each purpose was first seen.
pub fn purpose_distribution(visits: &[Visit], top_n: usize) -> Vec<PurposeCount> {
  let mut order: Vec<PurposeCount> = Vec::new();
  let mut index: HashMap<&str, usize> = HashMap::new();

  for v in visits {
    let purpose = match v.purpose.trim() {
      "" => UNKNOWN_PURPOSE,
      p => p,
    };
    match index.get(purpose) {
      Some(&i) => order[i].count += 1,
      None => {
        index.insert(purpose, order.len());
        order.push(PurposeCount { purpose: purpose.to_owned(), count: 1 });
      }
    }
  }

  // `sort_by` is stable, which preserves first-seen order among equal counts.
  order.sort_by(|a, b| b.count.cmp(&a.count));
  order.truncate(top_n);
  order
}

/// Mean visit length in hours over completed visits; `0.0` when there are none.
pub fn average_duration(visits: &[Visit]) -> f64 {
  let durations: Vec<Duration> = visits.iter().filter_map(Visit::duration).collect();
  if durations.is_empty() {
    return 0.0;
  }

  let total_secs: f64 = durations
    .iter()
    .map(|d| d.num_milliseconds() as f64 / 1000.0)
    .sum();
  total_secs / SECONDS_PER_HOUR / durations.len() as f64
}

pub fn summary_stats<Tz: TimeZone>(
  visits: &[Visit],
  now: DateTime<Utc>,
  tz: &Tz,
) -> SummaryStats {
  let today = now.with_timezone(tz).date_naive();
  SummaryStats {
    total:                  visits.len(),
    inside:                 visits.iter().filter(|v| v.is_inside()).count(),
    today:                  visits
      .iter()
      .filter(|v| v.check_in_time.with_timezone(tz).date_naive() == today)
      .count(),
    average_duration_hours: average_duration(visits),
  }
}

/// Counts over the visits still inside at `now`.
pub fn presence_stats(visits: &[Visit], now: DateTime<Utc>) -> PresenceStats {
  visits
    .iter()
    .filter(|v| v.is_inside())
    .fold(PresenceStats::default(), |mut acc, v| {
      let inside_for = now - v.check_in_time;
      acc.total += 1;
      if inside_for < Duration::hours(1) {
        acc.recent += 1;
      }
      if inside_for > Duration::hours(4) {
        acc.long_stay += 1;
      }
      acc
    })
}

pub fn history_stats(visits: &[Visit]) -> HistoryStats {
  let active = visits.iter().filter(|v| v.is_inside()).count();
  HistoryStats {
    total: visits.len(),
    completed: visits.len() - active,
    active,
    average_duration_hours: average_duration(visits),
  }
}

/// Round hours to one decimal place for display.
pub fn round_hours(hours: f64) -> f64 { (hours * 10.0).round() / 10.0 }
