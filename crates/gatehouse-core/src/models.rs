//! Domain models for Gatehouse.
//!
//! Plain data records shared across all crates. Persistence concerns live
//! behind the traits in [`crate::repository`].

pub mod session;
pub mod user;
