//! Application state controller.
//!
//! Owns what a UI would render: the signed-in user, the selected month, the
//! contribution list, a loading flag, and a dismissible error. Sequences all
//! fetch/add/edit/delete intents against the ledger client and reconciles
//! state after each mutation with a full re-fetch of the current month — the
//! displayed list always reflects store truth, at the cost of one extra round
//! trip per mutation. (Optimistic local patching with reconciliation is a
//! possible future refinement, not implemented.)
//!
//! The loading flag is a UI mutual-exclusion signal, not a lock: a mutation
//! intent arriving while one is outstanding is dropped with a log line, and
//! nothing coordinates concurrent sessions in other processes.

use crate::auth::{IdentityProvider, SessionCache, SessionContext};
use crate::errors::Error;
use crate::ledger::LedgerClient;
use crate::models::{Contribution, ContributionUpdate, Month, NewContribution, User};
use crate::store::LedgerStore;
use crate::util;
use tracing::{debug, info, warn};

/// Classification of a surfaced error, so a UI can pick remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The session expired; the user must sign in again.
    AuthRequired,
    /// The store is not shared with the signed-in account.
    Permission,
    /// Anything else; carries whatever detail the store provided.
    Data,
}

/// A dismissible, user-visible error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub class: ErrorClass,
    pub message: String,
}

/// State controller for one application window.
pub struct AppController<S, I> {
    ledger: LedgerClient<S>,
    identity: I,
    session_cache: SessionCache,
    session: Option<SessionContext>,
    user: Option<User>,
    month: Month,
    contributions: Vec<Contribution>,
    loading: bool,
    error: Option<UiError>,
}

impl<S: LedgerStore, I: IdentityProvider> AppController<S, I> {
    /// Controller in the signed-out state, month preselected to the current
    /// calendar month.
    pub fn new(ledger: LedgerClient<S>, identity: I, session_cache: SessionCache) -> Self {
        Self {
            ledger,
            identity,
            session_cache,
            session: None,
            user: None,
            month: Month::current(),
            contributions: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// Restores the cached display profile from the previous run, if any.
    /// This is display continuity only; data access still requires a fresh
    /// sign-in.
    pub fn restore_profile(&mut self) {
        if let Some(user) = self.session_cache.load() {
            debug!("Restored cached profile for {}", user.email);
            self.user = Some(user);
        }
    }

    /// Establishes a session from an issued access token: resolves the
    /// profile, persists it, and loads the current month.
    pub async fn sign_in(&mut self, access_token: String) {
        let session = SessionContext::new(access_token);
        match self.identity.user_info(&session).await {
            Ok(user) => {
                info!("Signed in as {}", user.email);
                if let Err(e) = self.session_cache.save(&user) {
                    warn!("Could not persist session profile: {e}");
                }
                self.user = Some(user);
                self.session = Some(session);
                self.error = None;
                self.refresh().await;
            }
            Err(e) => self.surface_failure(e),
        }
    }

    /// Tears the session down: best-effort token revocation, cache cleared,
    /// all ledger state dropped.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = self.identity.revoke(&session).await {
                warn!("Token revocation failed: {e}");
            }
        }
        if let Err(e) = self.session_cache.clear() {
            warn!("Could not clear session cache: {e}");
        }
        self.user = None;
        self.contributions.clear();
        self.error = None;
        info!("Signed out");
    }

    /// Switches the selected month. The displayed list is discarded
    /// immediately and replaced only by the new month's fetch; lists are
    /// never merged across months and nothing is cached.
    pub async fn select_month(&mut self, month: Month) {
        self.month = month;
        self.contributions.clear();
        self.refresh().await;
    }

    /// Full re-fetch of the selected month.
    pub async fn refresh(&mut self) {
        let Some(session) = self.session.clone() else {
            self.contributions.clear();
            return;
        };
        self.loading = true;
        match self.ledger.fetch_contributions(&session, self.month).await {
            Ok(list) => {
                self.contributions = list;
                self.error = None;
            }
            Err(e) => self.surface_failure(e),
        }
        self.loading = false;
    }

    /// Records a contribution for the signed-in user, then re-fetches.
    pub async fn add_contribution(&mut self, amount: f64, note: String) {
        let Some((session, user)) = self.active_session() else {
            return;
        };
        if self.reject_if_busy("add") {
            return;
        }
        let new = NewContribution {
            user_email: user.email,
            user_name: user.name,
            amount,
            note,
            month: self.month,
        };
        self.loading = true;
        match self.ledger.add_contribution(&session, &new).await {
            Ok(_) => {
                self.loading = false;
                self.refresh().await;
            }
            Err(e) => {
                self.surface_failure(e);
                self.loading = false;
            }
        }
    }

    /// Applies a partial update to one of the user's entries, then
    /// re-fetches.
    pub async fn edit_contribution(&mut self, id: &str, updates: ContributionUpdate) {
        let Some(session) = self.session.clone() else {
            return;
        };
        if self.reject_if_busy("edit") {
            return;
        }
        self.loading = true;
        match self
            .ledger
            .update_contribution(&session, id, &updates, self.month)
            .await
        {
            Ok(()) => {
                self.loading = false;
                self.refresh().await;
            }
            Err(e) => {
                self.surface_failure(e);
                self.loading = false;
            }
        }
    }

    /// Deletes one of the user's entries, then re-fetches. The request is
    /// only issued once the user has confirmed; an unconfirmed intent does
    /// nothing.
    pub async fn delete_contribution(&mut self, id: &str, confirmed: bool) {
        if !confirmed {
            debug!(%id, "delete not confirmed, ignoring");
            return;
        }
        let Some(session) = self.session.clone() else {
            return;
        };
        if self.reject_if_busy("delete") {
            return;
        }
        self.loading = true;
        match self
            .ledger
            .delete_contribution(&session, id, self.month)
            .await
        {
            Ok(()) => {
                self.loading = false;
                self.refresh().await;
            }
            Err(e) => {
                self.surface_failure(e);
                self.loading = false;
            }
        }
    }

    fn active_session(&self) -> Option<(SessionContext, User)> {
        match (&self.session, &self.user) {
            (Some(s), Some(u)) => Some((s.clone(), u.clone())),
            _ => None,
        }
    }

    fn reject_if_busy(&self, intent: &str) -> bool {
        if self.loading {
            warn!("Dropping '{intent}' intent while another operation is in flight");
        }
        self.loading
    }

    /// Classifies a failure into the user-visible taxonomy. An expired
    /// session clears the user and cache; a permission problem keeps the
    /// session and points at sharing configuration; everything else surfaces
    /// with the store's detail.
    fn surface_failure(&mut self, err: Error) {
        warn!("Operation failed: {err}");
        self.error = Some(match err {
            Error::AuthExpired => {
                self.session = None;
                self.user = None;
                if let Err(e) = self.session_cache.clear() {
                    warn!("Could not clear session cache: {e}");
                }
                UiError {
                    class: ErrorClass::AuthRequired,
                    message: "Session expired. Please sign in again.".to_string(),
                }
            }
            Error::PermissionDenied { .. } => UiError {
                class: ErrorClass::Permission,
                message: "Permission denied: ensure the sheet is shared with editor access to your account.".to_string(),
            },
            other => UiError {
                class: ErrorClass::Data,
                message: format!("Data error: {other}"),
            },
        });
    }

    // Accessors a rendering layer would bind to.

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&UiError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Sum of the displayed month's amounts.
    pub fn total(&self) -> f64 {
        let amounts: Vec<f64> = self.contributions.iter().map(|c| c.amount).collect();
        util::calculate_total(&amounts)
    }
}
