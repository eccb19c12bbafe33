//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use gatepass_core::{
  profile::{NewProfile, Role},
  store::{ProfileStore, SettingsStore, VisitQuery, VisitStore},
  visit::{ChangeKind, CheckOut, NewVisit, VisitStatus, VisitorDetails},
};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t(hour: u32, min: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 14, hour, min, 0).unwrap()
}

fn new_visit(name: &str, purpose: &str, at: DateTime<Utc>) -> NewVisit {
  NewVisit {
    visitor:       VisitorDetails {
      full_name:       name.into(),
      phone_number:    "9876543210".into(),
      purpose:         purpose.into(),
      visiting_person: "Dr. Mehta".into(),
      department:      "Physics".into(),
    },
    check_in_time: at,
  }
}

fn new_profile(email: &str, role: Option<Role>) -> NewProfile {
  NewProfile {
    email: email.into(),
    full_name: Some("Desk Officer".into()),
    role,
    password_hash: "$argon2id$stub".into(),
  }
}

// ─── Visits ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_visit() {
  let s = store().await;

  let visit = s.insert_visit(new_visit("Ravi Kumar", "Delivery", t(9, 0))).await.unwrap();
  assert_eq!(visit.status, VisitStatus::Inside);
  assert!(visit.check_out_time.is_none());
  assert!(visit.remarks.is_none());

  let fetched = s.get_visit(visit.id).await.unwrap().expect("visit exists");
  assert_eq!(fetched, visit);
}

#[tokio::test]
async fn get_visit_missing_returns_none() {
  let s = store().await;
  assert!(s.get_visit(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn close_visit_applies_transition_once() {
  let s = store().await;
  let visit = s.insert_visit(new_visit("Ravi Kumar", "Delivery", t(9, 0))).await.unwrap();

  let closed = s
    .close_visit(visit.id, CheckOut::new(t(10, 30), Some("Signed out at gate")))
    .await
    .unwrap()
    .expect("first checkout applies");
  assert_eq!(closed.status, VisitStatus::Outside);
  assert_eq!(closed.check_out_time, Some(t(10, 30)));
  assert_eq!(closed.remarks.as_deref(), Some("Signed out at gate"));

  let again = s.close_visit(visit.id, CheckOut::new(t(11, 0), None)).await.unwrap();
  assert!(again.is_none());

  // The first checkout is left untouched.
  let stored = s.get_visit(visit.id).await.unwrap().unwrap();
  assert_eq!(stored.check_out_time, Some(t(10, 30)));
}

#[tokio::test]
async fn close_visit_unknown_id_returns_none() {
  let s = store().await;
  let res = s.close_visit(Uuid::new_v4(), CheckOut::new(t(10, 0), None)).await.unwrap();
  assert!(res.is_none());
}

#[tokio::test]
async fn checkout_never_precedes_check_in() {
  let s = store().await;
  let visit = s.insert_visit(new_visit("Ravi Kumar", "Delivery", t(9, 0))).await.unwrap();

  let closed = s
    .close_visit(visit.id, CheckOut::new(t(8, 45), None))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(closed.check_out_time, Some(t(9, 0)));
  assert_eq!(closed.remarks.as_deref(), Some("No remarks"));
}

#[tokio::test]
async fn concurrent_closes_only_one_applies() {
  let s = store().await;
  let visit = s.insert_visit(new_visit("Ravi Kumar", "Delivery", t(9, 0))).await.unwrap();

  let (a, b) = (s.clone(), s.clone());
  let (ra, rb) = tokio::join!(
    a.close_visit(visit.id, CheckOut::new(t(10, 0), Some("a"))),
    b.close_visit(visit.id, CheckOut::new(t(10, 5), Some("b"))),
  );
  let applied = [ra.unwrap(), rb.unwrap()].into_iter().flatten().count();
  assert_eq!(applied, 1);
}

#[tokio::test]
async fn query_filters_and_orders() {
  let s = store().await;
  let early = s.insert_visit(new_visit("Asha Rao", "Interview", t(8, 0))).await.unwrap();
  let mid = s.insert_visit(new_visit("Ravi Kumar", "Delivery", t(12, 0))).await.unwrap();
  let late = s.insert_visit(new_visit("Meena Iyer", "Meeting", t(16, 0))).await.unwrap();
  s.close_visit(mid.id, CheckOut::new(t(13, 0), None)).await.unwrap();

  let all = s.query_visits(&VisitQuery::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|v| v.id).collect();
  assert_eq!(ids, vec![late.id, mid.id, early.id]);

  let active = s.query_visits(&VisitQuery::active()).await.unwrap();
  assert_eq!(active.len(), 2);
  assert!(active.iter().all(|v| v.status == VisitStatus::Inside));

  let window = VisitQuery {
    checked_in_after: Some(t(8, 0)),
    checked_in_before: Some(t(16, 0)),
    ..Default::default()
  };
  let in_window: Vec<_> =
    s.query_visits(&window).await.unwrap().into_iter().map(|v| v.id).collect();
  assert_eq!(in_window, vec![mid.id, early.id]);

  let paged = VisitQuery { limit: Some(1), offset: Some(1), ..Default::default() };
  let page = s.query_visits(&paged).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].id, mid.id);
}

#[tokio::test]
async fn text_search_is_case_insensitive_and_escapes_wildcards() {
  let s = store().await;
  s.insert_visit(new_visit("Asha Rao", "Interview", t(8, 0))).await.unwrap();
  s.insert_visit(new_visit("Ravi Kumar", "100% audit", t(9, 0))).await.unwrap();

  let by_name = VisitQuery { text: Some("asha".into()), ..Default::default() };
  assert_eq!(s.query_visits(&by_name).await.unwrap().len(), 1);

  let by_phone = VisitQuery { text: Some("98765".into()), ..Default::default() };
  assert_eq!(s.query_visits(&by_phone).await.unwrap().len(), 2);

  let literal = VisitQuery { text: Some("0% a".into()), ..Default::default() };
  let hits = s.query_visits(&literal).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].full_name, "Ravi Kumar");

  let underscore = VisitQuery { text: Some("_".into()), ..Default::default() };
  assert!(s.query_visits(&underscore).await.unwrap().is_empty());
}

#[tokio::test]
async fn text_search_folds_non_ascii_case() {
  let s = store().await;
  s.insert_visit(new_visit("Élodie Ñúñez", "Conférence", t(8, 0))).await.unwrap();
  s.insert_visit(new_visit("Asha Rao", "Interview", t(9, 0))).await.unwrap();

  for needle in ["élodie", "ÑÚÑEZ", "CONFÉRENCE"] {
    let query = VisitQuery { text: Some(needle.into()), ..Default::default() };
    let hits = s.query_visits(&query).await.unwrap();
    assert_eq!(hits.len(), 1, "{needle}");
    assert!(hits[0].matches_text(needle));
    assert_eq!(hits[0].full_name, "Élodie Ñúñez");
  }
}

#[tokio::test]
async fn writes_are_broadcast() {
  let s = store().await;
  let mut rx = s.subscribe();

  let visit = s.insert_visit(new_visit("Asha Rao", "Interview", t(8, 0))).await.unwrap();
  let change = rx.recv().await.unwrap();
  assert_eq!(change.kind, ChangeKind::Inserted);
  assert_eq!(change.visit_id, visit.id);

  s.close_visit(visit.id, CheckOut::new(t(9, 0), None)).await.unwrap();
  let change = rx.recv().await.unwrap();
  assert_eq!(change.kind, ChangeKind::Updated);

  // A rejected checkout writes nothing and announces nothing.
  s.close_visit(visit.id, CheckOut::new(t(9, 30), None)).await.unwrap();
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn reopened_file_keeps_visits() {
  let dir = std::env::temp_dir().join(format!("gatepass-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("visits.db");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.insert_visit(new_visit("Asha Rao", "Interview", t(8, 0))).await.unwrap().id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.get_visit(id).await.unwrap().is_some());
  let settings = s.list_settings().await.unwrap();
  assert_eq!(settings.len(), 8, "seeds are not duplicated on reopen");

  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_lookup_by_email_ignores_case() {
  let s = store().await;
  let p = s.add_profile(new_profile("Guard@Campus.edu", Some(Role::Staff))).await.unwrap();

  let found = s.find_profile_by_email("guard@campus.edu").await.unwrap().unwrap();
  assert_eq!(found.id, p.id);
  assert_eq!(found.role, Some(Role::Staff));
  assert_eq!(found.password_hash, "$argon2id$stub");

  assert!(s.find_profile_by_email("nobody@campus.edu").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.add_profile(new_profile("guard@campus.edu", None)).await.unwrap();
  assert!(s.add_profile(new_profile("GUARD@campus.edu", None)).await.is_err());
}

#[tokio::test]
async fn profile_without_role_round_trips() {
  let s = store().await;
  let p = s.add_profile(new_profile("new@campus.edu", None)).await.unwrap();
  let fetched = s.get_profile(p.id).await.unwrap().unwrap();
  assert_eq!(fetched.role, None);
  assert_eq!(s.list_profiles().await.unwrap().len(), 1);
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_settings_are_seeded() {
  let s = store().await;
  let settings = s.list_settings().await.unwrap();

  let name = settings.iter().find(|s| s.key == "organization_name").unwrap();
  assert_eq!(name.category, "general");
  assert_eq!(name.value, json!("Main Campus"));
  assert!(name.updated_by.is_none());

  let categories: Vec<_> = settings.iter().map(|s| s.category.as_str()).collect();
  let mut sorted = categories.clone();
  sorted.sort();
  assert_eq!(categories, sorted);
}

#[tokio::test]
async fn update_settings_skips_unknown_keys() {
  let s = store().await;
  let admin = s.add_profile(new_profile("admin@campus.edu", Some(Role::Admin))).await.unwrap();

  let updates = BTreeMap::from([
    ("session_timeout_minutes".to_owned(), json!(30)),
    ("organization_name".to_owned(), json!("North Gate")),
    ("favourite_colour".to_owned(), json!("teal")),
  ]);
  let before = Utc::now() - Duration::seconds(1);
  let n = s.update_settings(updates, admin.id).await.unwrap();
  assert_eq!(n, 2);

  let settings = s.list_settings().await.unwrap();
  assert_eq!(settings.len(), 8);
  let timeout = settings.iter().find(|s| s.key == "session_timeout_minutes").unwrap();
  assert_eq!(timeout.value, json!(30));
  assert_eq!(timeout.updated_by, Some(admin.id));
  assert!(timeout.updated_at >= before);
  assert!(settings.iter().all(|s| s.key != "favourite_colour"));
}
