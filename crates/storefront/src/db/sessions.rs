//! Session repository.
//!
//! Expiry is checked on every lookup: an expired session found by token or
//! ID is deleted on the spot and reported as absent.

use chrono::{TimeDelta, Utc};

use marketplace_core::{SessionId, UserId};

use super::{JsonStore, RepositoryError, collections};
use crate::models::session::Session;
use crate::services::auth::tokens::generate_token;

/// Default session lifetime in hours (7 days).
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 7 * 24;

/// Repository for session records.
pub struct SessionRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Open a new session for `user_id` lasting `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn create(&self, user_id: UserId, ttl: TimeDelta) -> Result<Session, RepositoryError> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            user_id,
            token: generate_token(),
            expires_at: now + ttl,
            created_at: now,
        };

        self.store.insert(collections::SESSIONS, session).await
    }

    /// Get a live session by its cookie token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let session = self
            .store
            .find(collections::SESSIONS, |s: &Session| s.token == token)
            .await?;
        self.discard_if_expired(session).await
    }

    /// Get a live session by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        let session = self
            .store
            .find(collections::SESSIONS, |s: &Session| s.id == id)
            .await?;
        self.discard_if_expired(session).await
    }

    /// Delete a session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn delete(&self, id: SessionId) -> Result<bool, RepositoryError> {
        self.store
            .delete(collections::SESSIONS, |s: &Session| s.id == id)
            .await
    }

    /// Delete every session belonging to a user, returning how many there were.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        self.store
            .delete_where(collections::SESSIONS, |s: &Session| s.user_id == user_id)
            .await
    }

    /// Remove sessions whose expiry is not in the future.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn cleanup_expired(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        self.store
            .delete_where(collections::SESSIONS, |s: &Session| s.expires_at <= now)
            .await
    }

    async fn discard_if_expired(
        &self,
        session: Option<Session>,
    ) -> Result<Option<Session>, RepositoryError> {
        match session {
            Some(session) if session.is_expired(Utc::now()) => {
                tracing::debug!(session_id = %session.id, "removing expired session");
                self.delete(session.id).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }
}
