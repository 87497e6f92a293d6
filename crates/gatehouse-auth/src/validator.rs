//! Session validation.
//!
//! A presented `(user, ip, client, password)` tuple is valid for a stored
//! session iff the session belongs to the user, both digests match fresh
//! derivations, the session is active and its expiry lies in the future.
//! Every failure collapses into `false`.

use chrono::Utc;
use gatehouse_core::models::session::Session;
use gatehouse_core::repository::UserDirectory;
use subtle::Choice;
use tracing::debug;
use uuid::Uuid;

use crate::hash;

/// Checks presented credentials against stored sessions.
pub struct SessionValidator<D: UserDirectory> {
    directory: D,
}

impl<D: UserDirectory> SessionValidator<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Returns `true` only if every check passes. Never errors: a
    /// directory miss, a digest mismatch and an expired or revoked session
    /// are indistinguishable to the caller.
    pub async fn validate(
        &self,
        session: &Session,
        user_id: Uuid,
        ip_address: &str,
        client: &str,
        password: &str,
    ) -> bool {
        validate_session(&self.directory, session, user_id, ip_address, client, password).await
    }
}

pub(crate) async fn validate_session<D: UserDirectory>(
    directory: &D,
    session: &Session,
    user_id: Uuid,
    ip_address: &str,
    client: &str,
    password: &str,
) -> bool {
    let salt = match directory.get_user_salt(user_id).await {
        Ok(salt) => salt,
        Err(e) => {
            debug!(%user_id, error = %e, "Session validation failed closed on salt lookup");
            return false;
        }
    };

    // Derive both digests before comparing anything.
    let derived = hash::derive_pair_blocking(
        hash::client_identity(ip_address, client),
        password.to_string(),
        salt,
    )
    .await;
    let (expected_session, expected_password) = match derived {
        Ok(pair) => pair,
        Err(e) => {
            debug!(%user_id, error = %e, "Session validation failed closed on derivation");
            return false;
        }
    };

    let session_match = hash::digest_eq(&session.session_hash, &expected_session);
    let password_match = hash::digest_eq(&session.password_hash, &expected_password);
    let owner_match = Choice::from(u8::from(session.user_id == user_id));
    let timely = Choice::from(u8::from(session.is_timely(Utc::now())));

    let valid = bool::from(session_match & password_match & owner_match & timely);
    if !valid {
        debug!(%user_id, session_id = ?session.id, "Session validation failed");
    }
    valid
}
