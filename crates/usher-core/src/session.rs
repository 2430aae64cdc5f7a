//! Session resolution.
//!
//! Sessions are issued by the external auth provider; this module only
//! resolves a presented token into a live `(User, Session)` pair. Expired
//! sessions are pruned lazily on lookup.

use std::sync::Arc;

use chrono::Utc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::identity::{CreateSession, Session, User};
use crate::store::Store;

/// Resolves session tokens against the shared store.
pub struct SessionLookup<S: Store> {
    config: Arc<AppConfig>,
    store: Arc<S>,
}

impl<S: Store> SessionLookup<S> {
    pub fn new(config: Arc<AppConfig>, store: Arc<S>) -> Self {
        Self { config, store }
    }

    /// Look up a session by token, deleting it if expired.
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = self.store.get_session(token).await?;

        if let Some(ref session) = session
            && session.expires_at < Utc::now()
        {
            self.store.delete_session(token).await?;
            return Ok(None);
        }

        Ok(session)
    }

    /// Resolve a token into the authenticated user and their session.
    pub async fn resolve(&self, token: &str) -> Result<Option<(User, Session)>> {
        if let Some(session) = self.get_session(token).await?
            && let Some(user) = self.store.get_user_by_id(&session.user_id).await?
        {
            return Ok(Some((user, session)));
        }
        Ok(None)
    }

    /// Create a session for a user. Stands in for the auth provider in
    /// tests and local development.
    pub async fn create_session(&self, user: &User) -> Result<Session> {
        let create = CreateSession {
            user_id: user.id.clone(),
            expires_at: Utc::now() + self.config.session.expires_in,
        };
        self.store.create_session(create).await
    }

    /// Name of the cookie carrying the session token.
    pub fn cookie_name(&self) -> &str {
        &self.config.session.cookie_name
    }
}
