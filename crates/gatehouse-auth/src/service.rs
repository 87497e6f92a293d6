//! Session service: creation, listing with expiry pruning, deletion and
//! revocation.

use chrono::{Duration, SubsecRound, Utc};
use gatehouse_core::error::{GatehouseError, GatehouseResult};
use gatehouse_core::models::session::{CreateSession, Session};
use gatehouse_core::repository::{SessionRepository, UserDirectory};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::hash;
use crate::validator;

/// Input for session creation.
#[derive(Debug)]
pub struct NewSession {
    pub user_id: Uuid,
    pub ip_address: String,
    /// Client or device descriptor, e.g. a user agent.
    pub client: String,
    pub password: String,
    /// Lifetime in seconds; `None` uses the configured default. Zero or
    /// negative values produce an already-expired session.
    pub ttl_secs: Option<i64>,
}

/// Result of [`SessionService::list_active`].
///
/// Pruning an expired session may fail without aborting the listing.
/// `sessions` always holds every unexpired session that was read;
/// `prune_error` holds the error from the last failed prune, if any.
#[derive(Debug, Default)]
pub struct ActiveSessions {
    pub sessions: Vec<Session>,
    pub prune_error: Option<GatehouseError>,
}

impl ActiveSessions {
    /// Collapse into a plain result, discarding the sessions when a prune
    /// failed.
    pub fn into_result(self) -> GatehouseResult<Vec<Session>> {
        match self.prune_error {
            Some(err) => Err(err),
            None => Ok(self.sessions),
        }
    }
}

/// Session lifecycle service.
///
/// Generic over the directory and repository so that the auth layer has
/// no dependency on the database crate.
pub struct SessionService<D: UserDirectory, S: SessionRepository> {
    directory: D,
    session_repo: S,
    config: SessionConfig,
}

impl<D: UserDirectory, S: SessionRepository> SessionService<D, S> {
    pub fn new(directory: D, session_repo: S, config: SessionConfig) -> Self {
        Self {
            directory,
            session_repo,
            config,
        }
    }

    /// Create and persist a session for the given client identity and
    /// password.
    pub async fn create(&self, input: NewSession) -> GatehouseResult<Session> {
        // 1. Resolve the salt; fails with UserNotFound.
        let salt = self.directory.get_user_salt(input.user_id).await?;

        // 2. Derive both digests off the executor.
        let (session_hash, password_hash) = hash::derive_pair_blocking(
            hash::client_identity(&input.ip_address, &input.client),
            input.password,
            salt,
        )
        .await?;

        // 3. Compute the expiry at whole-second precision.
        let ttl_secs = input.ttl_secs.unwrap_or(self.config.session_ttl_secs);
        let expires_at = Duration::try_seconds(ttl_secs)
            .and_then(|ttl| Utc::now().trunc_subsecs(0).checked_add_signed(ttl))
            .ok_or_else(|| GatehouseError::Validation {
                message: format!("session ttl out of range: {ttl_secs}"),
            })?;

        let session = self
            .session_repo
            .insert(CreateSession {
                user_id: input.user_id,
                session_hash,
                password_hash,
                expires_at,
                is_active: true,
            })
            .await?;

        debug!(
            user_id = %input.user_id,
            session_id = ?session.id,
            %expires_at,
            "Session created"
        );
        Ok(session)
    }

    /// List a user's unexpired sessions, deleting expired ones on the way.
    ///
    /// A failed prune does not stop the walk; see [`ActiveSessions`].
    /// Inactive but unexpired sessions are listed.
    pub async fn list_active(&self, user_id: Uuid) -> GatehouseResult<ActiveSessions> {
        self.directory.get_user_salt(user_id).await?;
        let sessions = self.session_repo.find_by_user_id(user_id).await?;

        let now = Utc::now();
        let mut active = ActiveSessions::default();
        for session in sessions {
            if !session.is_expired(now) {
                active.sessions.push(session);
                continue;
            }
            if let Err(err) = self.delete(&session).await {
                warn!(
                    %user_id,
                    session_id = ?session.id,
                    error = %err,
                    "Failed to prune expired session"
                );
                active.prune_error = Some(err);
            }
        }

        Ok(active)
    }

    /// Delete a single session by id, or by session hash when it has no id.
    ///
    /// Fails with `SessionNotExist` when nothing was deleted.
    pub async fn delete(&self, session: &Session) -> GatehouseResult<()> {
        let deleted = match session.id {
            Some(id) => self.session_repo.delete_by_id(id).await?,
            None => {
                self.session_repo
                    .delete_by_hash(&session.session_hash)
                    .await?
            }
        };

        if deleted == 0 {
            return Err(GatehouseError::SessionNotExist {
                user_id: session.user_id,
            });
        }
        Ok(())
    }

    /// Delete every session created from the given client identity.
    ///
    /// Stops at the first failed deletion and returns its error.
    pub async fn delete_by_client(
        &self,
        user_id: Uuid,
        ip_address: &str,
        client: &str,
    ) -> GatehouseResult<()> {
        let salt = self.directory.get_user_salt(user_id).await?;
        let session_hash =
            hash::derive_blocking(hash::client_identity(ip_address, client), salt).await?;

        let sessions = self
            .session_repo
            .find_by_session_hash(&session_hash)
            .await?;
        for session in &sessions {
            self.delete(session).await?;
        }

        debug!(%user_id, deleted = sessions.len(), "Deleted sessions by client");
        Ok(())
    }

    /// Mark a session inactive without deleting it (logout).
    pub async fn revoke(&self, session: &Session) -> GatehouseResult<()> {
        let updated = match session.id {
            Some(id) => self.session_repo.deactivate(id).await?,
            None => 0,
        };

        if updated == 0 {
            return Err(GatehouseError::SessionNotExist {
                user_id: session.user_id,
            });
        }
        Ok(())
    }

    /// Delete all sessions for a user (e.g. on salt rotation).
    pub async fn revoke_all(&self, user_id: Uuid) -> GatehouseResult<u64> {
        let deleted = self.session_repo.delete_by_user_id(user_id).await?;
        debug!(%user_id, deleted, "Revoked all sessions");
        Ok(deleted)
    }

    /// Delete every expired session across all users.
    pub async fn prune_expired(&self) -> GatehouseResult<u64> {
        self.session_repo.delete_expired(Utc::now()).await
    }

    /// Validate presented credentials against a stored session. See
    /// [`crate::validator::SessionValidator::validate`].
    pub async fn validate(
        &self,
        session: &Session,
        user_id: Uuid,
        ip_address: &str,
        client: &str,
        password: &str,
    ) -> bool {
        validator::validate_session(
            &self.directory,
            session,
            user_id,
            ip_address,
            client,
            password,
        )
        .await
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
