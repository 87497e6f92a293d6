//! User directory model.
//!
//! Gatehouse only needs the per-user salt; the rest of the account lives
//! in whatever directory backs [`crate::repository::UserDirectory`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Secret mixed into every session digest for this user. Changing it
    /// invalidates all of the user's sessions.
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
}
