//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored session binding a user, a client identity digest, a password
/// digest and an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Store-assigned identifier. `None` for a record that has not been
    /// persisted, or one that should be addressed by `session_hash`.
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    /// Hex digest of `ip_address + client` under the user's salt.
    pub session_hash: String,
    /// Hex digest of the password under the user's salt.
    pub password_hash: String,
    /// Whole-second precision; stored as epoch seconds.
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Session {
    /// Whether the session is active and `now` is strictly before its
    /// expiry.
    pub fn is_timely(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Whether the expiry has been reached at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub session_hash: String,
    pub password_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}
