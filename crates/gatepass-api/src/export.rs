//! Handler for `GET /export`.

use axum::{
  extract::{Query, State},
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use gatepass_core::export::{ExportKind, Exporter};
use serde::Deserialize;

use crate::{ApiState, AppStore, auth::Authenticated, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
  /// `visits` (default) or `profiles`.
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

/// `GET /export[?type=visits|profiles]`, served as a JSON attachment.
pub async fn handler<S: AppStore>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
  let actor = auth.actor()?;
  let kind = match params.kind.as_deref() {
    Some(k) => k.parse::<ExportKind>()?,
    None => ExportKind::default(),
  };

  let today = Utc::now().with_timezone(&state.config.utc_offset).date_naive();
  let doc = Exporter::new(state.store.clone())
    .export(&actor, kind, today)
    .await?;

  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", doc.filename))
    .map_err(|_| gatepass_core::Error::validation("type", "unusable export filename"))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(doc.content_type)),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      doc.body,
    )
      .into_response(),
  )
}
