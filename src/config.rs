//! Configuration management for the ledger application.
//!
//! The ledger targets one fixed spreadsheet for one fixed year, so most of
//! the surface is compile-time constants. The store identifier and OAuth
//! client identifier come from `ledger.toml` or the environment; the access
//! token itself is never part of the configuration (it is read from the
//! environment at the point of use, in `main`).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};

/// The fixed ledger year; partitions exist only for this year.
pub const APP_YEAR: i32 = 2025;

/// OAuth scope required for read/write access to the store.
pub const WRITE_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Canonical header row written to row 1 of every partition, columns A-F.
pub const HEADER_TITLES: [&str; 6] = ["ID", "Email", "Name", "Amount", "Note", "Timestamp"];

/// First row of the data region; row 1 is reserved for headers.
pub const DATA_START_ROW: u32 = 2;

/// Last column of the record layout (A..=F, six columns).
pub const LAST_COLUMN: char = 'F';

/// File the last signed-in user's display profile is cached in.
pub const SESSION_CACHE_FILE: &str = ".ledger_session.json";

const CONFIG_FILE: &str = "ledger.toml";

/// Runtime configuration resolved from file and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Identifier of the target spreadsheet.
    pub spreadsheet_id: String,
    /// OAuth client identifier of the application.
    pub client_id: String,
    /// Ledger year, normally [`APP_YEAR`].
    pub year: i32,
}

#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    spreadsheet_id: Option<String>,
    client_id: Option<String>,
    year: Option<i32>,
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path:?}: {e}"),
    })?;
    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path:?}: {e}"),
    })
}

/// Loads the application configuration: `ledger.toml` if present, overridden
/// by `LEDGER_SPREADSHEET_ID` / `LEDGER_CLIENT_ID`. A spreadsheet id is
/// required from one of the two sources.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new(CONFIG_FILE);
    let file = if path.exists() {
        tracing::debug!("Loading configuration from {:?}", path);
        load_file_config(path)?
    } else {
        FileConfig::default()
    };

    let spreadsheet_id = env::var("LEDGER_SPREADSHEET_ID")
        .ok()
        .or(file.spreadsheet_id)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Config {
            message: "No spreadsheet id configured (ledger.toml or LEDGER_SPREADSHEET_ID)"
                .to_string(),
        })?;

    let client_id = env::var("LEDGER_CLIENT_ID")
        .ok()
        .or(file.client_id)
        .unwrap_or_default();

    Ok(AppConfig {
        spreadsheet_id,
        client_id,
        year: file.year.unwrap_or(APP_YEAR),
    })
}
