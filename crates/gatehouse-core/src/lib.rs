//! Gatehouse Core: shared domain models, error taxonomy and the storage
//! interfaces consumed by the session engine.

pub mod error;
pub mod models;
pub mod repository;
