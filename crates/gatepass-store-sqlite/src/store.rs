//! [`SqliteStore`], the SQLite implementation of the gatepass store traits.

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, functions::FunctionFlags, types::Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use gatepass_core::{
  profile::{NewProfile, Profile},
  settings::Setting,
  store::{ProfileStore, SettingsStore, Store, VisitQuery, VisitStore},
  visit::{ChangeKind, CheckOut, NewVisit, Visit, VisitChange},
};

use crate::{
  Result,
  encode::{
    PROFILE_COLUMNS, RawProfile, RawSetting, RawVisit, VISIT_COLUMNS, decode_dt, encode_dt,
    encode_role, encode_status, encode_uuid, like_pattern,
  },
  error::Error,
  schema::SCHEMA,
};

/// Buffered change notifications per subscriber before it starts lagging.
const CHANGE_CAPACITY: usize = 256;

/// SQL function that lower-cases text with full Unicode rules. SQLite's own
/// `lower()` and `LIKE` only fold ASCII.
const FOLD_CASE_FN: &str = "fold_case";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A gatepass store backed by a single SQLite file.
///
/// Cloning is cheap: the connection and the change channel are both shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<VisitChange>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    let store = Self { conn, changes };
    store.register_functions().await?;
    store.init_schema().await?;
    Ok(store)
  }

  async fn register_functions(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          FOLD_CASE_FN,
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn notify(&self, kind: ChangeKind, visit_id: Uuid) {
    // No receivers is fine; nobody is watching.
    let receivers = self.changes.send(VisitChange { kind, visit_id }).unwrap_or(0);
    debug!(?kind, %visit_id, receivers, "visit change broadcast");
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── Visits ──────────────────────────────────────────────────────────────────

impl VisitStore for SqliteStore {
  async fn insert_visit(&self, input: NewVisit) -> Result<Visit> {
    let mut visit = Visit::from_new(Uuid::new_v4(), input);

    let id_str     = encode_uuid(visit.id);
    let status_str = encode_status(visit.status);
    let in_str     = encode_dt(visit.check_in_time);
    // Hand back exactly what a later read will return (microseconds).
    visit.check_in_time = decode_dt(&in_str)?;
    let row        = visit.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO visits (
             visit_id, full_name, phone_number, purpose, visiting_person,
             department, status, check_in_time
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            row.full_name,
            row.phone_number,
            row.purpose,
            row.visiting_person,
            row.department,
            status_str,
            in_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.notify(ChangeKind::Inserted, visit.id);
    Ok(visit)
  }

  async fn get_visit(&self, id: Uuid) -> Result<Option<Visit>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VISIT_COLUMNS} FROM visits WHERE visit_id = ?1"),
              rusqlite::params![id_str],
              RawVisit::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn close_visit(&self, id: Uuid, checkout: CheckOut) -> Result<Option<Visit>> {
    let id_str  = encode_uuid(id);
    let out_str = encode_dt(checkout.at);
    let remarks = checkout.remarks;

    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        // The status guard makes the transition happen at most once, however
        // many checkouts race for the same visit.
        let changed = conn.execute(
          "UPDATE visits
              SET status         = 'OUTSIDE',
                  check_out_time = CASE WHEN check_in_time > ?2
                                        THEN check_in_time ELSE ?2 END,
                  remarks        = ?3
            WHERE visit_id = ?1 AND status = 'INSIDE'",
          rusqlite::params![id_str, out_str, remarks],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {VISIT_COLUMNS} FROM visits WHERE visit_id = ?1"),
              rusqlite::params![id_str],
              RawVisit::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    let visit = raw.into_visit()?;
    self.notify(ChangeKind::Updated, visit.id);
    Ok(Some(visit))
  }

  async fn query_visits<'a>(&'a self, query: &'a VisitQuery) -> Result<Vec<Visit>> {
    let mut conds: Vec<&'static str> = vec![];
    let mut params: Vec<Value> = vec![];

    if let Some(status) = query.status {
      conds.push("status = ?");
      params.push(Value::Text(encode_status(status).to_owned()));
    }
    if let Some(after) = query.checked_in_after {
      conds.push("check_in_time >= ?");
      params.push(Value::Text(encode_dt(after)));
    }
    if let Some(before) = query.checked_in_before {
      conds.push("check_in_time < ?");
      params.push(Value::Text(encode_dt(before)));
    }
    if let Some(text) = query.text.as_deref() {
      // Same rules as `Visit::matches_text`: folded name, purpose and host;
      // phone number verbatim.
      conds.push(
        "(fold_case(full_name) LIKE ? ESCAPE '\\'
          OR fold_case(purpose) LIKE ? ESCAPE '\\'
          OR fold_case(visiting_person) LIKE ? ESCAPE '\\'
          OR instr(phone_number, ?) > 0)",
      );
      let pattern = like_pattern(&text.to_lowercase());
      params.extend(std::iter::repeat_n(Value::Text(pattern), 3));
      params.push(Value::Text(text.to_owned()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    // SQLite treats a negative LIMIT as "no limit".
    params.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
    params.push(Value::Integer(query.offset.unwrap_or(0) as i64));

    let sql = format!(
      "SELECT {VISIT_COLUMNS} FROM visits
       {where_clause}
       ORDER BY check_in_time DESC, visit_id
       LIMIT ? OFFSET ?"
    );

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawVisit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  fn subscribe(&self) -> broadcast::Receiver<VisitChange> { self.changes.subscribe() }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      id:            Uuid::new_v4(),
      email:         input.email,
      full_name:     input.full_name,
      role:          input.role,
      created_at:    Utc::now(),
      password_hash: input.password_hash,
    };

    let id_str   = encode_uuid(profile.id);
    let email    = profile.email.clone();
    let name     = profile.full_name.clone();
    let role_str = profile.role.map(encode_role);
    let hash     = profile.password_hash.clone();
    let at_str   = encode_dt(profile.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, email, full_name, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, name, role_str, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
              rusqlite::params![id_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn find_profile_by_email<'a>(&'a self, email: &'a str) -> Result<Option<Profile>> {
    let email = email.trim().to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        // `email` is declared COLLATE NOCASE.
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ?1"),
              rusqlite::params![email],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at, email"
        ))?;
        let rows = stmt
          .query_map([], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }
}

// ─── Settings ────────────────────────────────────────────────────────────────

impl SettingsStore for SqliteStore {
  async fn list_settings(&self) -> Result<Vec<Setting>> {
    let raws: Vec<RawSetting> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT setting_key, category, setting_value, updated_by, updated_at
             FROM settings
            ORDER BY category, setting_key",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSetting {
              setting_key:   row.get(0)?,
              category:      row.get(1)?,
              setting_value: row.get(2)?,
              updated_by:    row.get(3)?,
              updated_at:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSetting::into_setting).collect()
  }

  async fn update_settings(
    &self,
    updates: BTreeMap<String, serde_json::Value>,
    updated_by: Uuid,
  ) -> Result<usize> {
    let encoded = updates
      .into_iter()
      .map(|(key, value)| Ok((key, serde_json::to_string(&value)?)))
      .collect::<Result<Vec<_>>>()?;
    let by_str = encode_uuid(updated_by);
    let at_str = encode_dt(Utc::now());

    let (updated, skipped): (usize, Vec<String>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut updated = 0;
        let mut skipped = Vec::new();
        {
          let mut stmt = tx.prepare(
            "UPDATE settings
                SET setting_value = ?2, updated_by = ?3, updated_at = ?4
              WHERE setting_key = ?1",
          )?;
          for (key, value) in encoded {
            match stmt.execute(rusqlite::params![key, value, by_str, at_str])? {
              0 => skipped.push(key),
              n => updated += n,
            }
          }
        }
        tx.commit()?;
        Ok((updated, skipped))
      })
      .await?;

    if !skipped.is_empty() {
      warn!(?skipped, "ignored unknown setting keys");
    }
    Ok(updated)
  }
}
