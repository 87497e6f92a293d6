//! Error types for the Gatehouse system.

use thiserror::Error;
use uuid::Uuid;

/// Message shown to callers for every authentication failure.
///
/// Wrong credentials, unknown users and expired or revoked sessions all
/// render identically so the response leaks nothing about which check
/// failed.
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

#[derive(Debug, Error)]
pub enum GatehouseError {
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("Session does not exist for user {user_id}")]
    SessionNotExist { user_id: Uuid },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Remote authentication timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Remote authentication rejected")]
    AccessRejected,

    #[error("Remote authentication returned unsupported response code {code}")]
    UnsupportedResponse { code: u8 },

    #[error("Remote authentication transport error: {0}")]
    RemoteTransport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatehouseError {
    /// Whether this error means "the presented credentials did not
    /// authenticate", as opposed to an infrastructure failure.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            GatehouseError::UserNotFound { .. }
                | GatehouseError::SessionNotExist { .. }
                | GatehouseError::AccessRejected
        )
    }

    /// Caller-facing message. Authentication failures collapse into
    /// [`AUTHENTICATION_FAILED`]; the `Display` output keeps the detail
    /// for logs.
    pub fn public_message(&self) -> String {
        if self.is_authentication_failure() {
            AUTHENTICATION_FAILED.to_string()
        } else {
            self.to_string()
        }
    }
}

pub type GatehouseResult<T> = Result<T, GatehouseError>;
