//! Profiles: who may use the application, and in which role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role assigned to a profile; gates which operations are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Staff,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Staff => "staff",
    }
  }
}

/// A user identity. Profiles are created by an administrator; a profile
/// without a role can authenticate but cannot perform any operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id:            Uuid,
  pub email:         String,
  pub full_name:     Option<String>,
  pub role:          Option<Role>,
  pub created_at:    DateTime<Utc>,
  /// argon2 PHC string. Never leaves the process.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
}

/// Input to [`crate::store::ProfileStore::add_profile`].
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub email:         String,
  pub full_name:     Option<String>,
  pub role:          Option<Role>,
  pub password_hash: String,
}
