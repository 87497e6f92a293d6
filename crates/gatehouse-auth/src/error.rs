//! Authentication error types.

use gatehouse_core::error::GatehouseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GatehouseError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => GatehouseError::Crypto(msg),
        }
    }
}
