//! Error types for `gatepass-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::access::Capability;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was missing or malformed. User-correctable.
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("visit not found: {0}")]
  NotFound(Uuid),

  #[error("visit {0} is already checked out")]
  InvalidState(Uuid),

  #[error("the current role may not {0}")]
  Forbidden(Capability),

  #[error("no role has been assigned to this user")]
  RoleNotAssigned,

  /// Transport or backend failure. Never retried automatically.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
