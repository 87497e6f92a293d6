//! Gatehouse RADIUS: password verification delegated to a RADIUS
//! server with a single, deadline-bounded Access-Request exchange.

pub mod client;
pub mod config;
pub mod error;
pub mod packet;

pub use client::{RadiusClient, authenticate};
pub use config::RadiusConfig;
pub use error::RadiusError;
