//! Email verification token repository.
//!
//! The plain token only ever leaves this module inside the verification
//! link; the collection holds its SHA-256 digest.

use chrono::{TimeDelta, Utc};

use marketplace_core::{UserId, VerificationTokenId};

use super::{JsonStore, RepositoryError, collections};
use crate::models::verification_token::VerificationToken;
use crate::services::auth::tokens::{generate_token, hash_token, verify_token};

/// Verification tokens expire after 30 minutes.
pub const VERIFICATION_TOKEN_TTL_MINUTES: i64 = 30;

/// Repository for verification token records.
pub struct VerificationTokenRepository<'a> {
    store: &'a JsonStore,
}

impl<'a> VerificationTokenRepository<'a> {
    /// Create a new verification token repository.
    #[must_use]
    pub const fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Issue a token for `user_id`.
    ///
    /// Returns the plain token (for the verification link) together with the
    /// stored record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn create(
        &self,
        user_id: UserId,
    ) -> Result<(String, VerificationToken), RepositoryError> {
        let token = generate_token();
        let now = Utc::now();
        let record = VerificationToken {
            id: VerificationTokenId::new(),
            user_id,
            token_hash: hash_token(&token),
            expires_at: now + TimeDelta::minutes(VERIFICATION_TOKEN_TTL_MINUTES),
            created_at: now,
        };

        let record = self
            .store
            .insert(collections::VERIFICATION_TOKENS, record)
            .await?;
        Ok((token, record))
    }

    /// Resolve a plain token to the user it was issued for.
    ///
    /// An expired token is deleted and treated as unknown. A live token is
    /// left in place; callers remove it once verification succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn verify(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let record = self
            .store
            .find(collections::VERIFICATION_TOKENS, |t: &VerificationToken| {
                verify_token(&t.token_hash, token)
            })
            .await?;

        match record {
            None => Ok(None),
            Some(record) if record.is_expired(Utc::now()) => {
                tracing::debug!(token_id = %record.id, "removing expired verification token");
                self.delete(record.id).await?;
                Ok(None)
            }
            Some(record) => Ok(Some(record.user_id)),
        }
    }

    /// Delete a token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn delete(&self, id: VerificationTokenId) -> Result<bool, RepositoryError> {
        self.store
            .delete(collections::VERIFICATION_TOKENS, |t: &VerificationToken| {
                t.id == id
            })
            .await
    }

    /// Delete every token issued to a user, returning how many there were.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        self.store
            .delete_where(collections::VERIFICATION_TOKENS, |t: &VerificationToken| {
                t.user_id == user_id
            })
            .await
    }

    /// Remove tokens whose expiry is not in the future.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub async fn cleanup_expired(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        self.store
            .delete_where(collections::VERIFICATION_TOKENS, |t: &VerificationToken| {
                t.expires_at <= now
            })
            .await
    }
}
