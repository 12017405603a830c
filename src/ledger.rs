//! Ledger client: the orchestration layer between typed contributions and
//! the row-oriented remote store.
//!
//! Two policies live here and must be preserved exactly:
//!
//! 1. **Lazy partition creation.** A month partition is created (with its
//!    header row) the first time it is read or written; a read of a missing
//!    partition never surfaces the not-found failure, and a failed append
//!    triggers creation and exactly one retry.
//! 2. **Re-fetch before mutate.** Row positions are not identity. Every
//!    update and delete re-fetches the partition, locates the record by its
//!    opaque identifier, and acts on the freshly derived position. Handles
//!    are never cached or reused across calls.
//!
//! Concurrent edits from other sessions are not serialized; the re-fetch
//! narrows but does not close the lost-update window (last write wins).

use crate::auth::SessionContext;
use crate::config::{APP_YEAR, HEADER_TITLES};
use crate::errors::{Error, Result};
use crate::mapper;
use crate::models::{Contribution, ContributionUpdate, Month, NewContribution, RowHandle};
use crate::store::{LedgerStore, RawRow};
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tracing::{debug, info, instrument};

const ID_LENGTH: usize = 9;
const ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates the client-side opaque identifier stored in column A:
/// 9 base-36 characters, low collision probability, no global uniqueness
/// guarantee.
fn generate_entry_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_CHARSET[rng.random_range(0..ID_CHARSET.len())] as char)
        .collect()
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// The six canonical columns of one record row.
fn encode_row(
    id: &str,
    email: &str,
    name: &str,
    amount: f64,
    note: &str,
    timestamp: i64,
) -> RawRow {
    vec![
        json!(id),
        json!(email),
        json!(name),
        json!(amount),
        json!(note),
        json!(timestamp),
    ]
}

fn header_row() -> RawRow {
    HEADER_TITLES.iter().map(|title| json!(title)).collect()
}

/// Client for one remote ledger, generic over the store backend.
pub struct LedgerClient<S> {
    store: S,
    year: i32,
}

impl<S: LedgerStore> LedgerClient<S> {
    pub fn new(store: S) -> Self {
        Self::with_year(store, APP_YEAR)
    }

    pub fn with_year(store: S, year: i32) -> Self {
        Self { store, year }
    }

    /// Creates the month's partition and writes the canonical header row.
    async fn create_month_partition(&self, session: &SessionContext, month: Month) -> Result<()> {
        info!(%month, "creating month partition");
        self.store.create_partition(session, month).await?;
        self.store
            .write_row(session, month, RowHandle::header(), header_row())
            .await
    }

    /// Reads all contributions of a month, in store order.
    ///
    /// A missing partition is created on the spot and reported as empty; the
    /// caller never sees the underlying range-not-found failure.
    #[instrument(skip(self, session))]
    pub async fn fetch_contributions(
        &self,
        session: &SessionContext,
        month: Month,
    ) -> Result<Vec<Contribution>> {
        match self.store.fetch_data_rows(session, month).await {
            Ok(rows) => Ok(mapper::map_rows(month, self.year, &rows)),
            Err(Error::RangeNotFound { .. }) => {
                self.create_month_partition(session, month).await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Appends a new contribution and returns its generated identifier.
    ///
    /// If the append fails because the partition does not exist, the
    /// partition is created and the append retried exactly once; any further
    /// failure propagates.
    #[instrument(skip(self, session, new), fields(month = %new.month))]
    pub async fn add_contribution(
        &self,
        session: &SessionContext,
        new: &NewContribution,
    ) -> Result<String> {
        validate_amount(new.amount)?;
        let id = generate_entry_id();
        let timestamp = Utc::now().timestamp_millis();
        let row = encode_row(
            &id,
            &new.user_email,
            &new.user_name,
            new.amount,
            &new.note,
            timestamp,
        );

        match self.store.append_row(session, new.month, row.clone()).await {
            Ok(()) => {}
            Err(Error::RangeNotFound { .. }) => {
                self.create_month_partition(session, new.month).await?;
                self.store.append_row(session, new.month, row).await?;
            }
            Err(e) => return Err(e),
        }
        info!(%id, month = %new.month, "appended contribution");
        Ok(id)
    }

    /// Merges `updates` over the current values of the identified record and
    /// overwrites its row. Amount and note are overridable; owner identity
    /// and timestamp are immutable.
    ///
    /// Fails with [`Error::RecordNotFound`] if the identifier is absent from
    /// a fresh fetch of the partition.
    #[instrument(skip(self, session, updates))]
    pub async fn update_contribution(
        &self,
        session: &SessionContext,
        id: &str,
        updates: &ContributionUpdate,
        month: Month,
    ) -> Result<()> {
        if let Some(amount) = updates.amount {
            validate_amount(amount)?;
        }

        let current = self.fetch_contributions(session, month).await?;
        let existing = current
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::RecordNotFound {
                id: id.to_string(),
                month,
            })?;

        let amount = updates.amount.unwrap_or(existing.amount);
        let note = updates.note.as_deref().unwrap_or(&existing.note);
        let row = encode_row(
            &existing.id,
            &existing.user_email,
            &existing.user_name,
            amount,
            note,
            existing.timestamp,
        );
        self.store
            .write_row(session, month, existing.row, row)
            .await?;
        info!(%id, %month, "updated contribution");
        Ok(())
    }

    /// Clears the identified record's row (the row itself remains as a gap,
    /// so other records keep their positions). Deleting a record that is
    /// already gone is a silent no-op.
    #[instrument(skip(self, session))]
    pub async fn delete_contribution(
        &self,
        session: &SessionContext,
        id: &str,
        month: Month,
    ) -> Result<()> {
        let current = self.fetch_contributions(session, month).await?;
        let Some(existing) = current.iter().find(|c| c.id == id) else {
            debug!(%id, %month, "delete target already gone");
            return Ok(());
        };
        self.store.clear_row(session, month, existing.row).await?;
        info!(%id, %month, "cleared contribution row");
        Ok(())
    }
}

impl<S> LedgerClient<S> {
    /// Backend access for test assertions.
    #[cfg(test)]
    pub(crate) fn store_ref(&self) -> &S {
        &self.store
    }
}
