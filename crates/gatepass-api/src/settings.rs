//! Handlers for `/settings`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/settings` | `{ "settings": { category: { key: value } } }` |
//! | `POST` | `/settings` | Body: `{ "settings": { key: value, ... } }`; unknown keys are ignored |

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use gatepass_core::settings::{GroupedSettings, SettingsService};
use serde::{Deserialize, Serialize};

use crate::{ApiState, AppStore, auth::Authenticated, body::JsonBody, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SettingsView {
  pub settings: GroupedSettings,
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
  pub settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResult {
  pub updated: usize,
}

/// `GET /settings`
pub async fn get_all<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
) -> Result<Json<SettingsView>, ApiError> {
  let actor = auth.actor()?;
  let settings = SettingsService::new(state.store.clone()).settings(&actor).await?;
  Ok(Json(SettingsView { settings }))
}

/// `POST /settings`
pub async fn update<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  JsonBody(body): JsonBody<SettingsUpdate>,
) -> Result<Json<UpdateResult>, ApiError> {
  let actor = auth.actor()?;
  let updated = SettingsService::new(state.store.clone()).update(&actor, body.settings).await?;
  Ok(Json(UpdateResult { updated }))
}
