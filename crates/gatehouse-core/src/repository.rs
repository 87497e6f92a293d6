//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The session engine receives
//! implementations at construction time; nothing here assumes a
//! particular storage engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GatehouseResult;
use crate::models::session::{CreateSession, Session};

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

pub trait UserDirectory: Send + Sync {
    /// Resolve the per-user salt.
    ///
    /// Returns `GatehouseError::UserNotFound` when the user is unknown.
    fn get_user_salt(&self, user_id: Uuid) -> impl Future<Output = GatehouseResult<String>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Storage for session records.
///
/// Each single delete is assumed atomic; no operation spans more than one
/// call. Delete operations report the number of rows they removed so the
/// caller can tell a stale reference from a storage failure.
pub trait SessionRepository: Send + Sync {
    /// Persist a new session and return it with its assigned id.
    fn insert(&self, input: CreateSession) -> impl Future<Output = GatehouseResult<Session>> + Send;
    /// All sessions of a user, oldest first.
    fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Vec<Session>>> + Send;
    fn find_by_session_hash(
        &self,
        session_hash: &str,
    ) -> impl Future<Output = GatehouseResult<Vec<Session>>> + Send;
    fn delete_by_id(&self, id: Uuid) -> impl Future<Output = GatehouseResult<u64>> + Send;
    fn delete_by_hash(&self, session_hash: &str)
    -> impl Future<Output = GatehouseResult<u64>> + Send;
    /// Clear `is_active` on a single session.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = GatehouseResult<u64>> + Send;
    /// Remove every session of a user (administrative bulk delete).
    fn delete_by_user_id(&self, user_id: Uuid)
    -> impl Future<Output = GatehouseResult<u64>> + Send;
    /// Remove every session whose expiry is at or before `now`.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = GatehouseResult<u64>> + Send;
}
