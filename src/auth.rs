//! Identity session handling.
//!
//! The consent flow itself (token issuance) happens outside this crate; what
//! arrives here is an already-issued access token. That token lives in a
//! [`SessionContext`] which is passed explicitly into every store and
//! identity call — acquired on sign-in, dropped on sign-out, never held as
//! ambient global state.

use crate::errors::{Error, Result};
use crate::models::User;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// An established identity session: one short-lived access token.
#[derive(Clone)]
pub struct SessionContext {
    access_token: String,
}

impl SessionContext {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

// Keep the token out of logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Identity provider boundary: profile lookup and token revocation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the display profile for the session's token.
    async fn user_info(&self, session: &SessionContext) -> Result<User>;

    /// Revokes the session's token. Best-effort; callers treat failure as
    /// non-fatal during sign-out.
    async fn revoke(&self, session: &SessionContext) -> Result<()>;
}

/// Production identity provider over the OAuth2 userinfo/revoke endpoints.
pub struct GoogleIdentity {
    http: reqwest::Client,
    userinfo_url: String,
    revoke_url: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    name: String,
    email: String,
    picture: Option<String>,
}

impl GoogleIdentity {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            userinfo_url: USERINFO_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
        }
    }
}

impl Default for GoogleIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn user_info(&self, session: &SessionContext) -> Result<User> {
        let resp = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(session.access_token())
            .send()
            .await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(Error::AuthExpired),
            status if !status.is_success() => Err(Error::Store {
                message: format!("userinfo request failed: HTTP {status}"),
            }),
            _ => {
                let info: UserInfoResponse = resp.json().await?;
                Ok(User {
                    email: info.email,
                    name: info.name,
                    photo_url: info.picture,
                })
            }
        }
    }

    async fn revoke(&self, session: &SessionContext) -> Result<()> {
        let resp = self
            .http
            .post(&self.revoke_url)
            .form(&[("token", session.access_token())])
            .send()
            .await?;
        if !resp.status().is_success() {
            // Revocation of an already-dead token is not worth failing
            // sign-out over.
            warn!(status = %resp.status(), "token revocation was not accepted");
        }
        Ok(())
    }
}

/// Persists the last signed-in user's display profile (never a credential)
/// across restarts, under a fixed file name.
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the cached profile, if a readable one exists.
    pub fn load(&self) -> Option<User> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring unreadable session cache {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Writes the profile to the cache file.
    pub fn save(&self, user: &User) -> Result<()> {
        fs::write(&self.path, serde_json::to_string(user)?)?;
        debug!("Cached session profile for {}", user.email);
        Ok(())
    }

    /// Removes the cache file. Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            photo_url: Some("https://example.com/ada.png".to_string()),
        }
    }

    #[test]
    fn session_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("session.json"));
        assert!(cache.load().is_none());

        cache.save(&sample_user()).unwrap();
        assert_eq!(cache.load(), Some(sample_user()));

        cache.clear().unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn clearing_a_missing_cache_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("absent.json"));
        cache.clear().unwrap();
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(SessionCache::new(path).load().is_none());
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let session = SessionContext::new("very-secret");
        let printed = format!("{session:?}");
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
