//! Gatehouse Auth: salted session digests, session validation and
//! session lifecycle management.

pub mod config;
pub mod error;
pub mod hash;
pub mod service;
pub mod validator;

pub use config::SessionConfig;
pub use error::AuthError;
pub use service::{ActiveSessions, NewSession, SessionService};
pub use validator::SessionValidator;
