//! `ledger-sync` - a shared monthly contribution ledger backed by a remote
//! spreadsheet.
//!
//! This crate provides the synchronization core between typed contribution
//! records and a Sheets-style tabular store partitioned into month-named
//! tabs: the record mapper, the ledger client with its lazy partition
//! creation and re-fetch-before-mutate discipline, and the application state
//! controller a UI drives.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::expect_used,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,       // Will add gradually
    clippy::missing_panics_doc,       // Will add gradually
    clippy::cast_possible_truncation, // Row offsets and cent counts stay small
    clippy::cast_sign_loss,
)]

/// Identity session context, provider boundary, and profile cache
pub mod auth;
/// Fixed ledger constants and runtime configuration
pub mod config;
/// Application state controller - user, month, list, loading, errors
pub mod controller;
/// Unified error types and result handling
pub mod errors;
/// Ledger client - typed CRUD over the partitioned store
pub mod ledger;
/// Record mapper - raw store rows to typed contributions
pub mod mapper;
/// Domain types: months, users, contributions, row handles
pub mod models;
/// Remote store trait and the Sheets HTTP implementation
pub mod store;
/// Currency display helpers
pub mod util;

#[cfg(test)]
pub mod test_utils;
