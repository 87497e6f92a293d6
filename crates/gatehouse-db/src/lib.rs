//! Gatehouse Database: SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - [`SessionRepository`](gatehouse_core::repository::SessionRepository)
//!   and [`UserDirectory`](gatehouse_core::repository::UserDirectory)
//!   implementations in [`repository`]
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
