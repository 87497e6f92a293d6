//! Deterministic salted digests using Argon2id.
//!
//! Session and password fingerprints are derived with fixed cost
//! parameters so that the same `(secret, salt)` pair always yields the same
//! digest. Parameters: memory 64 MiB, iterations 2, parallelism 8,
//! 50-byte output rendered as 100 lowercase hex characters.

use std::borrow::Cow;

use argon2::{Algorithm, Argon2, Params, Version};
use subtle::{Choice, ConstantTimeEq};

use crate::error::AuthError;

pub const TIME_COST: u32 = 2;
pub const MEMORY_COST_KIB: u32 = 65_536;
pub const PARALLELISM: u32 = 8;
pub const OUTPUT_LEN: usize = 50;

/// Length of a hex-encoded digest.
pub const DIGEST_HEX_LEN: usize = OUTPUT_LEN * 2;

/// Shortest salt Argon2 accepts.
const MIN_SALT_LEN: usize = 8;

/// Appended to salts shorter than [`MIN_SALT_LEN`].
const SALT_DOMAIN_TAG: &[u8] = b"gatehouse/session-digest";

fn argon2() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Salts of at least 8 bytes are used as-is; shorter ones get the tag.
fn salt_bytes(salt: &str) -> Cow<'_, [u8]> {
    if salt.len() >= MIN_SALT_LEN {
        return Cow::Borrowed(salt.as_bytes());
    }
    let mut extended = Vec::with_capacity(salt.len() + SALT_DOMAIN_TAG.len());
    extended.extend_from_slice(salt.as_bytes());
    extended.extend_from_slice(SALT_DOMAIN_TAG);
    Cow::Owned(extended)
}

/// Derive the hex digest of `secret` under `salt`.
///
/// Accepts any input, including empty strings. The error path only
/// reports Argon2 backend failures, which the fixed parameters rule out.
///
/// This is CPU- and memory-heavy; async callers should go through
/// [`derive_blocking`] or [`derive_pair_blocking`].
pub fn derive(secret: &str, salt: &str) -> Result<String, AuthError> {
    let mut output = [0u8; OUTPUT_LEN];
    argon2()?
        .hash_password_into(secret.as_bytes(), &salt_bytes(salt), &mut output)
        .map_err(|e| AuthError::Crypto(format!("argon2 derive error: {e}")))?;

    Ok(hex::encode(output))
}

/// [`derive`] on the blocking thread pool.
pub async fn derive_blocking(secret: String, salt: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || derive(&secret, &salt))
        .await
        .map_err(|e| AuthError::Crypto(format!("digest task failed: {e}")))?
}

/// Derive the client identity digest and the password digest in one
/// blocking task. Both are always computed.
pub async fn derive_pair_blocking(
    identity: String,
    password: String,
    salt: String,
) -> Result<(String, String), AuthError> {
    tokio::task::spawn_blocking(move || {
        let session_hash = derive(&identity, &salt);
        let password_hash = derive(&password, &salt);
        Ok::<_, AuthError>((session_hash?, password_hash?))
    })
    .await
    .map_err(|e| AuthError::Crypto(format!("digest task failed: {e}")))?
}

/// The client identity hashed into a session: IP address followed by the
/// client descriptor.
pub fn client_identity(ip_address: &str, client: &str) -> String {
    format!("{ip_address}{client}")
}

/// Constant-time digest equality.
///
/// Runs in time independent of where the inputs differ. Inputs of
/// different length compare unequal.
pub fn digest_eq(stored: &str, expected: &str) -> Choice {
    stored.as_bytes().ct_eq(expected.as_bytes())
}
