//! SurrealDB implementation of [`UserDirectory`].
//!
//! Salts are 32 random bytes, hex-encoded, generated once at user
//! creation.

use chrono::{DateTime, Utc};
use gatehouse_core::error::{GatehouseError, GatehouseResult};
use gatehouse_core::models::user::{CreateUser, User};
use gatehouse_core::repository::UserDirectory;
use rand::Rng;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    salt: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            salt: self.salt,
            created_at: self.created_at,
        }
    }
}

/// Generate a random per-user salt (64 hex chars = 32 bytes of entropy).
fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// SurrealDB-backed user directory.
#[derive(Clone)]
pub struct SurrealUserDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateUser) -> GatehouseResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query("CREATE type::record('user', $id) SET username = $username, salt = $salt")
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("salt", generate_salt()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    pub async fn get_by_id(&self, id: Uuid) -> GatehouseResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }
}

impl<C: Connection> UserDirectory for SurrealUserDirectory<C> {
    async fn get_user_salt(&self, user_id: Uuid) -> GatehouseResult<String> {
        match self.get_by_id(user_id).await {
            Ok(user) => Ok(user.salt),
            Err(GatehouseError::NotFound { .. }) => Err(GatehouseError::UserNotFound { user_id }),
            Err(e) => Err(e),
        }
    }
}
