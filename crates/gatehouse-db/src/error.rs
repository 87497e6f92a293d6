//! Database-specific error types and conversions.

use gatehouse_core::error::GatehouseError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for GatehouseError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GatehouseError::NotFound { entity, id },
            other => GatehouseError::Database(other.to_string()),
        }
    }
}
