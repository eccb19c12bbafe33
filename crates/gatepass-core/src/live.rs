//! Change-driven re-query.
//!
//! A [`LiveQuery`] never patches a cached result in place. Every change
//! notification triggers a fresh read from the store, so the caller always
//! holds the most recent snapshot it has received.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;

use crate::{
  Error, Result,
  store::{VisitQuery, VisitStore},
  visit::{Visit, VisitChange},
};

pub struct LiveQuery<S> {
  store:   Arc<S>,
  query:   VisitQuery,
  changes: broadcast::Receiver<VisitChange>,
}

impl<S: VisitStore> LiveQuery<S> {
  /// Subscribe before the first read so no change can slip in between.
  pub fn new(store: Arc<S>, query: VisitQuery) -> Self {
    let changes = store.subscribe();
    Self { store, query, changes }
  }

  pub fn query(&self) -> &VisitQuery { &self.query }

  /// Read the current snapshot.
  pub async fn refresh(&self) -> Result<Vec<Visit>> {
    self
      .store
      .query_visits(&self.query)
      .await
      .map_err(Error::store)
  }

  /// Wait for the next change and re-read. Notifications already queued are
  /// coalesced into the same read. Returns `None` once the store has shut
  /// down its notification channel.
  pub async fn next(&mut self) -> Option<Result<Vec<Visit>>> {
    match self.changes.recv().await {
      Ok(change) => debug!(visit_id = %change.visit_id, kind = ?change.kind, "visit changed"),
      Err(RecvError::Lagged(skipped)) => debug!(skipped, "change feed lagged"),
      Err(RecvError::Closed) => return None,
    }

    loop {
      match self.changes.try_recv() {
        Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
      }
    }

    Some(self.refresh().await)
  }
}
