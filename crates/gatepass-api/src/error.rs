//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use gatepass_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Shown instead of backend details when the store cannot be reached.
const RETRY_MESSAGE: &str = "the visitor log is temporarily unavailable, please retry";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error(transparent)]
  Body(#[from] JsonRejection),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Body(rejection) => rejection.status(),
      ApiError::Core(e) => match e {
        CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
        CoreError::Forbidden(_) | CoreError::RoleNotAssigned => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::InvalidState(_) => StatusCode::CONFLICT,
        CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  /// The message a client sees. Backend failures are never echoed back.
  pub fn public_message(&self) -> String {
    match self {
      ApiError::Core(CoreError::StoreUnavailable(_)) => RETRY_MESSAGE.to_owned(),
      ApiError::Body(rejection) => rejection.body_text(),
      other => other.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, ?status, "request failed");
    } else if status == StatusCode::FORBIDDEN {
      warn!(error = %self, "request refused");
    }

    let mut res = (status, Json(json!({ "error": self.public_message() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"gatepass\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let id = Uuid::new_v4();
    let cases = [
      (CoreError::validation("full_name", "is required"), StatusCode::BAD_REQUEST),
      (CoreError::RoleNotAssigned, StatusCode::FORBIDDEN),
      (CoreError::NotFound(id), StatusCode::NOT_FOUND),
      (CoreError::InvalidState(id), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn store_failures_hide_details() {
    let err = ApiError::from(CoreError::StoreUnavailable("disk I/O error".into()));
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.public_message(), RETRY_MESSAGE);
  }

  #[test]
  fn unauthorized_challenges_for_basic_auth() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
