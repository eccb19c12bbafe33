//! Application settings: key/value pairs grouped by category, readable and
//! bulk-updatable by admins only.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  access::{Actor, Capability},
  store::SettingsStore,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
  pub category:   String,
  pub key:        String,
  pub value:      serde_json::Value,
  pub updated_by: Option<Uuid>,
  pub updated_at: DateTime<Utc>,
}

/// `category → key → value`
pub type GroupedSettings = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

pub fn group_settings(settings: Vec<Setting>) -> GroupedSettings {
  let mut grouped = GroupedSettings::new();
  for s in settings {
    grouped.entry(s.category).or_default().insert(s.key, s.value);
  }
  grouped
}

pub struct SettingsService<S> {
  store: Arc<S>,
}

impl<S: SettingsStore> SettingsService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn settings(&self, actor: &Actor) -> Result<GroupedSettings> {
    actor.require(Capability::ManageSettings)?;
    let all = self.store.list_settings().await.map_err(Error::store)?;
    Ok(group_settings(all))
  }

  /// Overwrite existing settings. Keys the store does not know are ignored;
  /// the number of settings actually changed is returned.
  pub async fn update(
    &self,
    actor: &Actor,
    updates: BTreeMap<String, serde_json::Value>,
  ) -> Result<usize> {
    actor.require(Capability::ManageSettings)?;
    if updates.is_empty() {
      return Err(Error::validation("settings", "settings data required"));
    }

    let requested = updates.len();
    let updated = self
      .store
      .update_settings(updates, actor.user_id)
      .await
      .map_err(Error::store)?;

    info!(requested, updated, by = %actor.user_id, "settings updated");
    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn setting(category: &str, key: &str, value: serde_json::Value) -> Setting {
    Setting {
      category: category.into(),
      key: key.into(),
      value,
      updated_by: None,
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn groups_by_category() {
    let grouped = group_settings(vec![
      setting("general", "organization_name", json!("Main Campus")),
      setting("security", "session_timeout_minutes", json!(60)),
      setting("general", "contact_email", json!("desk@example.com")),
    ]);

    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["general"].len(), 2);
    assert_eq!(grouped["security"]["session_timeout_minutes"], json!(60));
  }

  #[test]
  fn no_settings_groups_to_empty() {
    assert!(group_settings(Vec::new()).is_empty());
  }
}
