//! Session domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{SessionId, UserId};

use super::user::PublicUser;
use crate::db::Record;

/// A login session, as stored in `sessions.json`.
///
/// The token is the opaque value carried in the session cookie. A user may
/// hold several sessions at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session is expired once its expiry lies strictly in the past.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl Record for Session {}

/// The resolved identity behind a session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub user: PublicUser,
}
