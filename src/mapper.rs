//! Record mapper: raw store rows to typed [`Contribution`]s.
//!
//! The store is untyped; cells arrive as JSON strings or numbers and any of
//! them may be missing. Mapping is a strict per-row parse with two documented
//! fallbacks: a missing or non-numeric amount becomes 0.0 and a missing note
//! becomes the empty string (availability over strictness). A missing
//! timestamp falls back to the current time.
//!
//! Positional row handles are reconstructed purely from sequence position
//! (offset + 2, the data region starting at row 2). They are only meaningful
//! for the fetch that produced them; every mutation re-derives them from a
//! fresh fetch.

use crate::models::{Contribution, Month, RowHandle};
use crate::store::RawRow;
use chrono::Utc;
use serde_json::Value;

/// Maps a fetched data block to contributions, in store order.
///
/// A fully blank row is a gap left by a delete: it produces no record but
/// still consumes its positional offset, so the handles of later records
/// match their actual sheet rows.
pub fn map_rows(month: Month, year: i32, rows: &[RawRow]) -> Vec<Contribution> {
    rows.iter()
        .enumerate()
        .filter_map(|(offset, row)| parse_row(month, year, offset, row))
        .collect()
}

fn parse_row(month: Month, year: i32, offset: usize, row: &RawRow) -> Option<Contribution> {
    if row.iter().all(cell_is_blank) {
        return None;
    }
    Some(Contribution {
        id: cell_string(row.first()),
        user_email: cell_string(row.get(1)),
        user_name: cell_string(row.get(2)),
        amount: cell_number(row.get(3)).unwrap_or(0.0),
        note: cell_string(row.get(4)),
        month,
        year,
        timestamp: cell_integer(row.get(5)).unwrap_or_else(|| Utc::now().timestamp_millis()),
        row: RowHandle::from_offset(offset),
    })
}

fn cell_is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_string(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn cell_number(cell: Option<&Value>) -> Option<f64> {
    match cell {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_integer(cell: Option<&Value>) -> Option<i64> {
    match cell {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
