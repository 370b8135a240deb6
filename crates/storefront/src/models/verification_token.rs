//! Email verification token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{UserId, VerificationTokenId};

use crate::db::Record;

/// A pending email verification, as stored in `verificationTokens.json`.
///
/// Only the SHA-256 digest of the token is stored; the plain token exists
/// solely in the verification link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    pub id: VerificationTokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl Record for VerificationToken {}
