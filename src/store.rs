//! Cached user snapshot shared between commands.
//!
//! The snapshot is only ever replaced wholesale with a freshly fetched copy.
//! The credit balance is never adjusted in place.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::api::{ApiError, ReportsApi, UserSnapshot};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<UserSnapshot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: UserSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(snapshot))),
        }
    }

    /// Overwrite the cached snapshot, returning the previous one.
    pub fn replace(&self, snapshot: UserSnapshot) -> Option<UserSnapshot> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            user = %snapshot.id,
            available_reports = snapshot.available_reports,
            "user snapshot replaced"
        );
        guard.replace(snapshot)
    }

    pub fn current(&self) -> Option<UserSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn available_reports(&self) -> Option<i64> {
        self.current().map(|s| s.available_reports)
    }

    /// Fetch the authoritative snapshot and store it.
    pub async fn refresh<A: ReportsApi>(&self, api: &A) -> Result<UserSnapshot, ApiError> {
        let snapshot = api.get_current_user_snapshot().await?;
        self.replace(snapshot.clone());
        Ok(snapshot)
    }
}
