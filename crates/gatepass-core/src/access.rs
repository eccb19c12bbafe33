//! Capability checks performed at every operation boundary.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  profile::{Profile, Role},
};

/// A named permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  RegisterVisit,
  CheckOutVisit,
  ViewVisits,
  ViewAnalytics,
  ExportVisits,
  ExportProfiles,
  ManageSettings,
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::RegisterVisit => "register visits",
      Self::CheckOutVisit => "check out visits",
      Self::ViewVisits => "view visits",
      Self::ViewAnalytics => "view analytics",
      Self::ExportVisits => "export visits",
      Self::ExportProfiles => "export profiles",
      Self::ManageSettings => "manage settings",
    })
  }
}

impl Role {
  /// Admins may do everything; staff run the front desk.
  pub fn allows(self, capability: Capability) -> bool {
    match self {
      Role::Admin => true,
      Role::Staff => matches!(
        capability,
        Capability::RegisterVisit
          | Capability::CheckOutVisit
          | Capability::ViewVisits
          | Capability::ExportVisits
      ),
    }
  }
}

/// An authenticated identity with an assigned role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  pub fn from_profile(profile: &Profile) -> Result<Self> {
    let role = profile.role.ok_or(Error::RoleNotAssigned)?;
    Ok(Self::new(profile.id, role))
  }

  pub fn require(&self, capability: Capability) -> Result<()> {
    if self.role.allows(capability) {
      Ok(())
    } else {
      tracing::warn!(user_id = %self.user_id, role = self.role.as_str(), %capability, "capability denied");
      Err(Error::Forbidden(capability))
    }
  }
}
