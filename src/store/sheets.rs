//! Sheets v4 values-API implementation of [`LedgerStore`].
//!
//! Range addressing follows the `<partition>!<startCol><startRow>:<endCol><endRow>`
//! scheme, columns A-F carrying {id, email, name, amount, note, timestamp}.
//! Non-success responses are classified into the crate error taxonomy by
//! status code plus the message in the standard error body.

use crate::auth::SessionContext;
use crate::config::{DATA_START_ROW, LAST_COLUMN};
use crate::errors::{Error, Result};
use crate::models::{Month, RowHandle};
use crate::store::{LedgerStore, RawRow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// HTTP client for one target spreadsheet.
pub struct SheetsStore {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
}

/// Full data region of a partition: `<month>!A2:F` (open-ended row range).
fn data_range(month: Month) -> String {
    format!("{month}!A{DATA_START_ROW}:{LAST_COLUMN}")
}

/// Single six-column row range: `<month>!A<r>:F<r>`.
fn row_range(month: Month, handle: RowHandle) -> String {
    let r = handle.sheet_row();
    format!("{month}!A{r}:{LAST_COLUMN}{r}")
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<RawRow>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Maps a non-success response to the error taxonomy. The store signals a
/// missing partition as HTTP 400 with a range-parse message; that becomes
/// [`Error::RangeNotFound`] so the ledger client can create the partition
/// lazily.
fn classify_failure(status: StatusCode, body: &str, range: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));

    match status {
        StatusCode::UNAUTHORIZED => Error::AuthExpired,
        StatusCode::FORBIDDEN => Error::PermissionDenied { message },
        StatusCode::BAD_REQUEST
            if message.contains("Unable to parse range") || message.contains("not find range") =>
        {
            Error::RangeNotFound {
                range: range.to_string(),
            }
        }
        _ => Error::Store { message },
    }
}

impl SheetsStore {
    /// Store client against the production endpoint.
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self::with_base_url(spreadsheet_id, DEFAULT_BASE_URL)
    }

    /// Store client against an alternate endpoint.
    pub fn with_base_url(spreadsheet_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn values_url(&self, range: &str, verb: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{range}{verb}",
            self.base_url, self.spreadsheet_id
        )
    }

    async fn expect_success(resp: reqwest::Response, range: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, range))
    }
}

#[async_trait]
impl LedgerStore for SheetsStore {
    #[instrument(skip(self, session))]
    async fn fetch_data_rows(&self, session: &SessionContext, month: Month) -> Result<Vec<RawRow>> {
        let range = data_range(month);
        let resp = self
            .http
            .get(self.values_url(&range, ""))
            .bearer_auth(session.access_token())
            .send()
            .await?;
        let resp = Self::expect_success(resp, &range).await?;
        let value_range: ValueRange = resp.json().await?;
        debug!(rows = value_range.values.len(), %month, "fetched data region");
        Ok(value_range.values)
    }

    #[instrument(skip(self, session, row))]
    async fn append_row(&self, session: &SessionContext, month: Month, row: RawRow) -> Result<()> {
        let range = data_range(month);
        let resp = self
            .http
            .post(self.values_url(&range, ":append"))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(session.access_token())
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        Self::expect_success(resp, &range).await?;
        Ok(())
    }

    #[instrument(skip(self, session, row))]
    async fn write_row(
        &self,
        session: &SessionContext,
        month: Month,
        handle: RowHandle,
        row: RawRow,
    ) -> Result<()> {
        let range = row_range(month, handle);
        let resp = self
            .http
            .put(self.values_url(&range, ""))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(session.access_token())
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        Self::expect_success(resp, &range).await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn clear_row(
        &self,
        session: &SessionContext,
        month: Month,
        handle: RowHandle,
    ) -> Result<()> {
        let range = row_range(month, handle);
        let resp = self
            .http
            .post(self.values_url(&range, ":clear"))
            .bearer_auth(session.access_token())
            .json(&json!({}))
            .send()
            .await?;
        Self::expect_success(resp, &range).await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn create_partition(&self, session: &SessionContext, month: Month) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let resp = self
            .http
            .post(url)
            .bearer_auth(session.access_token())
            .json(&json!({
                "requests": [
                    { "addSheet": { "properties": { "title": month.as_str() } } }
                ]
            }))
            .send()
            .await?;
        Self::expect_success(resp, month.as_str()).await?;
        debug!(%month, "created partition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_range_is_open_ended_from_row_two() {
        assert_eq!(data_range(Month::January), "January!A2:F");
        assert_eq!(data_range(Month::December), "December!A2:F");
    }

    #[test]
    fn row_range_spans_all_six_columns() {
        assert_eq!(row_range(Month::March, RowHandle::from_offset(0)), "March!A2:F2");
        assert_eq!(row_range(Month::March, RowHandle::from_offset(7)), "March!A9:F9");
        assert_eq!(row_range(Month::March, RowHandle::header()), "March!A1:F1");
    }

    #[test]
    fn unauthorized_classifies_as_auth_expired() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, "", "January!A2:F");
        assert!(matches!(err, Error::AuthExpired));
    }

    #[test]
    fn forbidden_carries_the_remote_message() {
        let body = r#"{"error":{"message":"The caller does not have permission"}}"#;
        let err = classify_failure(StatusCode::FORBIDDEN, body, "January!A2:F");
        match err {
            Error::PermissionDenied { message } => {
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn missing_partition_classifies_as_range_not_found() {
        let body = r#"{"error":{"message":"Unable to parse range: October!A2:F"}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, body, "October!A2:F");
        match err {
            Error::RangeNotFound { range } => assert_eq!(range, "October!A2:F"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn other_bad_requests_stay_generic() {
        let body = r#"{"error":{"message":"Invalid value at 'data.values'"}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, body, "October!A2:F");
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "<html>", "x");
        match err {
            Error::Store { message } => assert!(message.contains("500")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
