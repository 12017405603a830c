//! Domain types for the contribution ledger.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The twelve month partitions of the fixed ledger year. Each month maps to a
/// sheet (tab) of the same name in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    /// Partition name as it appears in the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }

    /// Month for a 0-based calendar index (0 = January).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The current calendar month, used as the initial selection at startup.
    pub fn current() -> Self {
        // month0 is always 0..=11, so the lookup cannot miss.
        Self::from_index(Utc::now().month0() as usize).unwrap_or(Self::January)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display profile of an authenticated user, as returned by the identity
/// provider. Persisted (without any credential) to the session cache for
/// reload continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
}

/// Ephemeral position of a record inside its partition's grid, 1-based as the
/// store counts rows (row 1 is the header, data starts at row 2).
///
/// This is deliberately NOT an identity: any insertion or deletion that shifts
/// rows invalidates it. Handles can only be minted inside the crate, from the
/// fetch that observed them, so a mutation is always paired with the fetch
/// that produced its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle(u32);

impl RowHandle {
    /// The fixed header row of every partition.
    pub(crate) const fn header() -> Self {
        Self(1)
    }

    /// Handle for the record at `offset` within a freshly fetched data block.
    /// The data region starts at sheet row 2.
    pub(crate) const fn from_offset(offset: usize) -> Self {
        Self(offset as u32 + 2)
    }

    /// 1-based sheet row number.
    pub(crate) const fn sheet_row(self) -> u32 {
        self.0
    }
}

/// A ledger entry as observed by the most recent fetch of its partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// Client-generated opaque identifier; the durable identity of the entry.
    pub id: String,
    /// Owner email; ownership checks match on this.
    pub user_email: String,
    pub user_name: String,
    /// Monetary amount in the single fixed currency.
    pub amount: f64,
    pub note: String,
    /// Partition the entry belongs to; entries never move partitions.
    pub month: Month,
    pub year: i32,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Position at the time of the fetch that produced this record.
    pub row: RowHandle,
}

/// Input for creating a contribution. Identifier and timestamp are generated
/// by the ledger client at append time.
#[derive(Debug, Clone)]
pub struct NewContribution {
    pub user_email: String,
    pub user_name: String,
    pub amount: f64,
    pub note: String,
    pub month: Month,
}

/// Partial update of a contribution. Owner identity and timestamp are
/// immutable; only amount and note can change.
#[derive(Debug, Clone, Default)]
pub struct ContributionUpdate {
    pub amount: Option<f64>,
    pub note: Option<String>,
}
