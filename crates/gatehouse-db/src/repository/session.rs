//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, TimeZone, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::session::{CreateSession, Session};
use gatehouse_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row shape returned by `CREATE` and `DELETE ... RETURN BEFORE`.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    session_hash: String,
    password_hash: String,
    expires_at: i64,
    is_active: bool,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    user_id: String,
    session_hash: String,
    password_hash: String,
    expires_at: i64,
    is_active: bool,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRecord(format!("invalid {what} UUID: {e}")))
}

fn from_epoch_secs(secs: i64) -> Result<DateTime<Utc>, DbError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| DbError::InvalidRecord(format!("expires_at out of range: {secs}")))
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<Session, DbError> {
        Ok(Session {
            id: Some(id),
            user_id: parse_uuid(&self.user_id, "user")?,
            session_hash: self.session_hash,
            password_hash: self.password_hash,
            expires_at: from_epoch_secs(self.expires_at)?,
            is_active: self.is_active,
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: Some(parse_uuid(&self.record_id, "session")?),
            user_id: parse_uuid(&self.user_id, "user")?,
            session_hash: self.session_hash,
            password_hash: self.password_hash,
            expires_at: from_epoch_secs(self.expires_at)?,
            is_active: self.is_active,
        })
    }
}

fn rows_into_sessions(rows: Vec<SessionRowWithId>) -> GatehouseResult<Vec<Session>> {
    rows.into_iter()
        .map(|row| row.try_into_session().map_err(Into::into))
        .collect()
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a statement that returns the affected rows and count them.
    async fn count_affected(
        &self,
        sql: &'static str,
        name: &'static str,
        value: String,
    ) -> GatehouseResult<u64> {
        let result = self
            .db
            .query(sql)
            .bind((name, value))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn insert(&self, input: CreateSession) -> GatehouseResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 session_hash = $session_hash, \
                 password_hash = $password_hash, \
                 expires_at = $expires_at, \
                 is_active = $is_active",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("session_hash", input.session_hash))
            .bind(("password_hash", input.password_hash))
            .bind(("expires_at", input.expires_at.timestamp()))
            .bind(("is_active", input.is_active))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> GatehouseResult<Vec<Session>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE user_id = $user_id ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_into_sessions(rows)
    }

    async fn find_by_session_hash(&self, session_hash: &str) -> GatehouseResult<Vec<Session>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE session_hash = $session_hash ORDER BY created_at ASC",
            )
            .bind(("session_hash", session_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_into_sessions(rows)
    }

    async fn delete_by_id(&self, id: Uuid) -> GatehouseResult<u64> {
        self.count_affected(
            "DELETE type::record('session', $id) RETURN BEFORE",
            "id",
            id.to_string(),
        )
        .await
    }

    async fn delete_by_hash(&self, session_hash: &str) -> GatehouseResult<u64> {
        self.count_affected(
            "DELETE session WHERE session_hash = $session_hash RETURN BEFORE",
            "session_hash",
            session_hash.to_string(),
        )
        .await
    }

    async fn deactivate(&self, id: Uuid) -> GatehouseResult<u64> {
        // A WHERE-filtered UPDATE never creates the record.
        self.count_affected(
            "UPDATE session SET is_active = false \
             WHERE id = type::record('session', $id) RETURN AFTER",
            "id",
            id.to_string(),
        )
        .await
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> GatehouseResult<u64> {
        self.count_affected(
            "DELETE session WHERE user_id = $user_id RETURN BEFORE",
            "user_id",
            user_id.to_string(),
        )
        .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> GatehouseResult<u64> {
        let result = self
            .db
            .query("DELETE session WHERE expires_at <= $now RETURN BEFORE")
            .bind(("now", now.timestamp()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
