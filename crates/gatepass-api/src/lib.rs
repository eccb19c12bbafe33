//! JSON REST API for the gatepass visitor log.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `gatepass-core` store traits. Every route authenticates with HTTP Basic
//! credentials checked against the profile table; TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gatepass_api::api_router(state))
//! ```

pub mod analytics;
pub mod auth;
pub mod body;
pub mod error;
pub mod export;
pub mod settings;
pub mod visits;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::{FixedOffset, Offset as _, Utc};
use gatepass_core::{
  lifecycle::VisitManager,
  store::{ProfileStore, SettingsStore, VisitStore},
};

pub use error::ApiError;

// ─── Store bound ─────────────────────────────────────────────────────────────

/// Everything a backend must provide to serve the API.
pub trait AppStore: VisitStore + ProfileStore + SettingsStore + 'static {}

impl<T> AppStore for T where T: VisitStore + ProfileStore + SettingsStore + 'static {}

// ─── State ───────────────────────────────────────────────────────────────────

/// Request-independent settings for the API handlers.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Offset used for "today" and for local dates and hours in analytics.
  pub utc_offset:             FixedOffset,
  pub analytics_window_days:  usize,
  pub analytics_top_purposes: usize,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      utc_offset:             Utc.fix(),
      analytics_window_days:  7,
      analytics_top_purposes: 6,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

impl<S: AppStore> ApiState<S> {
  pub fn new(store: Arc<S>, config: ApiConfig) -> Self {
    Self { store, config: Arc::new(config) }
  }

  pub(crate) fn visits(&self) -> VisitManager<S> { VisitManager::new(Arc::clone(&self.store)) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: AppStore>(state: ApiState<S>) -> Router<()> {
  Router::new()
    .route("/me", get(auth::me))
    // Visits
    .route("/visits", get(visits::list::<S>).post(visits::create::<S>))
    .route("/visits/active", get(visits::active::<S>))
    .route("/visits/stream", get(visits::stream::<S>))
    .route("/visits/{id}", get(visits::get_one::<S>))
    .route("/visits/{id}/checkout", post(visits::checkout::<S>))
    // Admin views
    .route("/analytics", get(analytics::handler::<S>))
    .route("/export", get(export::handler::<S>))
    .route("/settings", get(settings::get_all::<S>).post(settings::update::<S>))
    .with_state(state)
}
