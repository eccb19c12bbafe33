//! HTTP server assembly for the gatepass visitor log.
//!
//! Loads [`ServerConfig`], mounts the JSON API under `/api` and wraps it in
//! request tracing. The binary in `main.rs` does the I/O.

use std::path::PathBuf;

use axum::{Router, body::Body, http::Request};
use chrono::FixedOffset;
use gatepass_api::{ApiConfig, ApiState, AppStore, api_router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `gatepass.toml` and
/// `GATEPASS_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  /// Local time for "today" and for analytics, e.g. `+05:30`.
  pub utc_offset:             String,
  pub analytics_window_days:  usize,
  pub analytics_top_purposes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "127.0.0.1".to_string(),
      port:                   8080,
      store_path:             PathBuf::from("~/.local/share/gatepass/gatepass.db"),
      utc_offset:             "+00:00".to_string(),
      analytics_window_days:  7,
      analytics_top_purposes: 6,
    }
  }
}

impl ServerConfig {
  pub fn api_config(&self) -> Result<ApiConfig, chrono::ParseError> {
    Ok(ApiConfig {
      utc_offset:             self.utc_offset.trim().parse::<FixedOffset>()?,
      analytics_window_days:  self.analytics_window_days,
      analytics_top_purposes: self.analytics_top_purposes,
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: the API nested under `/api`, traced.
pub fn build_app<S: AppStore>(state: ApiState<S>) -> Router {
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
      tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
      )
    }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
