//! Remote ledger store interface.
//!
//! The store is a tabular backend organized into month-named partitions; each
//! partition is a grid with a header at row 1 and records from row 2. This
//! module defines the seam the ledger client talks through, so the production
//! HTTP backend and the in-memory test backend are interchangeable.

use crate::auth::SessionContext;
use crate::errors::Result;
use crate::models::{Month, RowHandle};
use async_trait::async_trait;

pub mod sheets;

pub use sheets::SheetsStore;

/// One raw row as the store returns it: up to six cells, each a JSON string
/// or number depending on how the cell was entered.
pub type RawRow = Vec<serde_json::Value>;

/// Operations the synchronization layer needs from the remote store.
///
/// Every call carries the session context explicitly; implementations must
/// not hold ambient credentials. Failures are classified into the crate
/// error taxonomy, in particular [`crate::errors::Error::RangeNotFound`] when
/// the month partition does not exist yet.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads the full data region (`A2:F`) of a partition, in store order.
    /// Cleared rows inside the region come back as empty cell lists.
    async fn fetch_data_rows(&self, session: &SessionContext, month: Month) -> Result<Vec<RawRow>>;

    /// Appends one record row after the last non-empty row of the partition.
    async fn append_row(&self, session: &SessionContext, month: Month, row: RawRow) -> Result<()>;

    /// Overwrites the six-column range at `handle` with `row`.
    async fn write_row(
        &self,
        session: &SessionContext,
        month: Month,
        handle: RowHandle,
        row: RawRow,
    ) -> Result<()>;

    /// Clears the six-column range at `handle`. The row itself remains, as an
    /// empty gap; later rows keep their positions.
    async fn clear_row(
        &self,
        session: &SessionContext,
        month: Month,
        handle: RowHandle,
    ) -> Result<()>;

    /// Creates the named partition (tab only; the caller writes the header).
    async fn create_partition(&self, session: &SessionContext, month: Month) -> Result<()>;
}
