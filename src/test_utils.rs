//! Shared test utilities.
//!
//! The in-memory [`MemoryStore`] stands in for the remote tabular backend
//! the same way an in-memory database would: it keeps one grid per month
//! partition (row 0 being the header row), mimics the backend's append and
//! clear semantics, and can be switched into failure modes to exercise the
//! controller's error classification.

use crate::auth::{IdentityProvider, SessionCache, SessionContext};
use crate::controller::AppController;
use crate::errors::{Error, Result};
use crate::ledger::LedgerClient;
use crate::models::{Month, NewContribution, RowHandle, User};
use crate::store::{LedgerStore, RawRow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Failure injected into store calls until cleared.
#[derive(Debug, Clone, Copy)]
pub enum FailMode {
    /// Every call fails with an expired session.
    AuthExpired,
    /// Every call fails with a sharing-permission rejection.
    PermissionDenied,
    /// Every call fails with a generic backend error.
    Store,
    /// Only partition creation fails; all other calls behave normally.
    PartitionCreation,
}

/// In-memory stand-in for the remote store.
pub struct MemoryStore {
    grids: Mutex<HashMap<Month, Vec<RawRow>>>,
    append_calls: Mutex<HashMap<Month, usize>>,
    fail: Mutex<Option<FailMode>>,
}

fn row_is_blank(row: &RawRow) -> bool {
    row.iter().all(|cell| match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn data_range(month: Month) -> String {
    format!("{month}!A2:F")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            grids: Mutex::new(HashMap::new()),
            append_calls: Mutex::new(HashMap::new()),
            fail: Mutex::new(None),
        }
    }

    /// Makes every subsequent call fail in the given mode (or succeed again
    /// with `None`).
    pub async fn fail_with(&self, mode: Option<FailMode>) {
        *self.fail.lock().await = mode;
    }

    /// Header row of a partition, if the partition exists.
    pub async fn header_row_of(&self, month: Month) -> Option<RawRow> {
        self.grids.lock().await.get(&month)?.first().cloned()
    }

    /// Number of append calls issued for a partition, including failed ones.
    pub async fn append_attempts(&self, month: Month) -> usize {
        self.append_calls.lock().await.get(&month).copied().unwrap_or(0)
    }

    async fn check_fail(&self) -> Result<()> {
        match *self.fail.lock().await {
            Some(FailMode::AuthExpired) => Err(Error::AuthExpired),
            Some(FailMode::PermissionDenied) => Err(Error::PermissionDenied {
                message: "The caller does not have permission".to_string(),
            }),
            Some(FailMode::Store) => Err(Error::Store {
                message: "injected backend failure".to_string(),
            }),
            Some(FailMode::PartitionCreation) | None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn fetch_data_rows(&self, _session: &SessionContext, month: Month) -> Result<Vec<RawRow>> {
        self.check_fail().await?;
        let grids = self.grids.lock().await;
        let grid = grids.get(&month).ok_or_else(|| Error::RangeNotFound {
            range: data_range(month),
        })?;
        let mut data: Vec<RawRow> = grid.iter().skip(1).cloned().collect();
        // The backend omits trailing empty rows but keeps interior gaps.
        while data.last().is_some_and(row_is_blank) {
            data.pop();
        }
        Ok(data)
    }

    async fn append_row(&self, _session: &SessionContext, month: Month, row: RawRow) -> Result<()> {
        *self.append_calls.lock().await.entry(month).or_insert(0) += 1;
        self.check_fail().await?;
        let mut grids = self.grids.lock().await;
        let grid = grids.get_mut(&month).ok_or_else(|| Error::RangeNotFound {
            range: data_range(month),
        })?;
        // Appends land after the last occupied row of the table.
        while grid.len() > 1 && grid.last().is_some_and(row_is_blank) {
            grid.pop();
        }
        grid.push(row);
        Ok(())
    }

    async fn write_row(
        &self,
        _session: &SessionContext,
        month: Month,
        handle: RowHandle,
        row: RawRow,
    ) -> Result<()> {
        self.check_fail().await?;
        let mut grids = self.grids.lock().await;
        let grid = grids.get_mut(&month).ok_or_else(|| Error::RangeNotFound {
            range: data_range(month),
        })?;
        let idx = handle.sheet_row() as usize - 1;
        if grid.len() <= idx {
            grid.resize(idx + 1, RawRow::new());
        }
        grid[idx] = row;
        Ok(())
    }

    async fn clear_row(
        &self,
        _session: &SessionContext,
        month: Month,
        handle: RowHandle,
    ) -> Result<()> {
        self.check_fail().await?;
        let mut grids = self.grids.lock().await;
        let grid = grids.get_mut(&month).ok_or_else(|| Error::RangeNotFound {
            range: data_range(month),
        })?;
        let idx = handle.sheet_row() as usize - 1;
        if let Some(slot) = grid.get_mut(idx) {
            *slot = RawRow::new();
        }
        Ok(())
    }

    async fn create_partition(&self, _session: &SessionContext, month: Month) -> Result<()> {
        if matches!(*self.fail.lock().await, Some(FailMode::PartitionCreation)) {
            return Err(Error::Store {
                message: "injected partition creation failure".to_string(),
            });
        }
        self.check_fail().await?;
        let mut grids = self.grids.lock().await;
        if grids.contains_key(&month) {
            return Err(Error::Store {
                message: format!("A sheet with the name \"{month}\" already exists"),
            });
        }
        grids.insert(month, Vec::new());
        Ok(())
    }
}

/// Identity provider double: a fixed profile, optionally rejecting tokens.
pub struct FakeIdentity {
    user: User,
    unauthorized: bool,
    revoked: AtomicBool,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self {
            user: test_user(),
            unauthorized: false,
            revoked: AtomicBool::new(false),
        }
    }

    /// Provider that rejects every token as expired.
    pub fn unauthorized() -> Self {
        Self {
            unauthorized: true,
            ..Self::new()
        }
    }

    pub fn was_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn user_info(&self, _session: &SessionContext) -> Result<User> {
        if self.unauthorized {
            return Err(Error::AuthExpired);
        }
        Ok(self.user.clone())
    }

    async fn revoke(&self, _session: &SessionContext) -> Result<()> {
        self.revoked.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// The standard test user.
pub fn test_user() -> User {
    User {
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
        photo_url: None,
    }
}

/// A session with a token the test doubles accept.
pub fn session() -> SessionContext {
    SessionContext::new("test-token")
}

/// A contribution input owned by the standard test user.
pub fn shared_new_contribution(month: Month, amount: f64, note: &str) -> NewContribution {
    NewContribution {
        user_email: "ada@example.com".to_string(),
        user_name: "Ada".to_string(),
        amount,
        note: note.to_string(),
        month,
    }
}

/// Cell rendered as text, for assertions against raw rows.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A session cache in its own temporary directory. The directory handle must
/// stay alive for the duration of the test; dropping it removes the files.
pub fn temp_session_cache() -> (SessionCache, TempDir) {
    let dir = tempfile::tempdir().expect("temporary directory for the session cache");
    let cache = SessionCache::new(dir.path().join("session.json"));
    (cache, dir)
}

/// A controller over a fresh in-memory store seeded with the given
/// `(month, amount, note)` entries, owned by the standard test user. The
/// returned directory handle keeps the controller's session cache alive.
pub async fn seeded_controller(
    seeds: &[(Month, f64, &str)],
) -> (AppController<MemoryStore, FakeIdentity>, TempDir) {
    let store = MemoryStore::new();
    let client = LedgerClient::new(store);
    let session = session();
    for (month, amount, note) in seeds {
        client
            .add_contribution(&session, &shared_new_contribution(*month, *amount, note))
            .await
            .expect("seeding the test store cannot fail");
    }
    let (cache, dir) = temp_session_cache();
    (AppController::new(client, FakeIdentity::new(), cache), dir)
}
