//! Unified error types and result handling.
//!
//! Every failure the synchronization layer can produce is a variant here, so
//! callers (the state controller in particular) can classify outcomes with a
//! single `match`: expired sessions, sharing misconfiguration, missing
//! partitions, and everything else.

use crate::models::Month;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The access token was rejected (HTTP 401). The session must be
    /// re-established by the user.
    #[error("authentication expired, sign in again")]
    AuthExpired,

    /// The store rejected the call for lack of sharing permissions
    /// (HTTP 403). The session itself is still valid.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The addressed range does not resolve, which for this store means the
    /// month partition has not been created yet.
    #[error("range not found: {range}")]
    RangeNotFound { range: String },

    /// No contribution with the given identifier exists in the partition.
    #[error("contribution '{id}' not found in {month}")]
    RecordNotFound { id: String, month: Month },

    /// Contribution amounts must be finite and strictly positive.
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// Unclassified store failure, carrying whatever detail the remote
    /// response provided.
    #[error("store error: {message}")]
    Store { message: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (session cache file, config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
