//! Remote authentication error types.

use gatehouse_core::error::GatehouseError;
use thiserror::Error;

use crate::packet::PacketError;

#[derive(Debug, Error)]
pub enum RadiusError {
    #[error("exchange timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("received Access-Reject")]
    AccessRejected,

    #[error("received unsupported packet code {code}")]
    UnsupportedResponse { code: u8 },

    #[error("invalid server address: {0}")]
    Address(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
}

impl From<RadiusError> for GatehouseError {
    fn from(err: RadiusError) -> Self {
        match err {
            RadiusError::Timeout { secs } => GatehouseError::Timeout { secs },
            RadiusError::AccessRejected => GatehouseError::AccessRejected,
            RadiusError::UnsupportedResponse { code } => {
                GatehouseError::UnsupportedResponse { code }
            }
            RadiusError::Packet(e) => GatehouseError::Validation {
                message: e.to_string(),
            },
            RadiusError::Address(_) | RadiusError::Transport(_) => {
                GatehouseError::RemoteTransport(err.to_string())
            }
        }
    }
}
