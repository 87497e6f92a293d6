//! Session service behaviour under storage failures and concurrency, using
//! in-memory repositories with fault injection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use gatehouse_auth::config::SessionConfig;
use gatehouse_auth::service::{ActiveSessions, NewSession, SessionService};
use gatehouse_core::error::{GatehouseError, GatehouseResult};
use gatehouse_core::models::session::{CreateSession, Session};
use gatehouse_core::repository::{SessionRepository, UserDirectory};
use uuid::Uuid;

#[derive(Clone, Default)]
struct MemoryDirectory {
    salts: Arc<HashMap<Uuid, String>>,
}

impl MemoryDirectory {
    fn with_user(user_id: Uuid) -> Self {
        let mut salts = HashMap::new();
        salts.insert(user_id, "0123456789abcdef".to_string());
        Self {
            salts: Arc::new(salts),
        }
    }
}

impl UserDirectory for MemoryDirectory {
    async fn get_user_salt(&self, user_id: Uuid) -> GatehouseResult<String> {
        self.salts
            .get(&user_id)
            .cloned()
            .ok_or(GatehouseError::UserNotFound { user_id })
    }
}

#[derive(Default)]
struct Store {
    sessions: Vec<Session>,
    /// Session ids whose deletion fails with a database error.
    failing: HashSet<Uuid>,
}

#[derive(Clone, Default)]
struct MemorySessionRepository {
    store: Arc<Mutex<Store>>,
}

impl MemorySessionRepository {
    /// Insert a raw session directly, bypassing hashing.
    fn seed(&self, user_id: Uuid, session_hash: &str, expires_at: DateTime<Utc>) -> Session {
        let session = Session {
            id: Some(Uuid::new_v4()),
            user_id,
            session_hash: session_hash.into(),
            password_hash: "password_hash".into(),
            expires_at,
            is_active: true,
        };
        self.store.lock().unwrap().sessions.push(session.clone());
        session
    }

    fn fail_delete_of(&self, session: &Session) {
        self.store
            .lock()
            .unwrap()
            .failing
            .insert(session.id.unwrap());
    }

    fn ids(&self) -> Vec<Uuid> {
        self.store
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter_map(|s| s.id)
            .collect()
    }
}

fn remove_where(store: &mut Store, pred: impl Fn(&Session) -> bool) -> GatehouseResult<u64> {
    if let Some(id) = store
        .sessions
        .iter()
        .filter(|s| pred(*s))
        .find_map(|s| s.id.filter(|id| store.failing.contains(id)))
    {
        return Err(GatehouseError::Database(format!("delete of {id} failed")));
    }
    let before = store.sessions.len();
    store.sessions.retain(|s| !pred(s));
    Ok((before - store.sessions.len()) as u64)
}

impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, input: CreateSession) -> GatehouseResult<Session> {
        let session = Session {
            id: Some(Uuid::new_v4()),
            user_id: input.user_id,
            session_hash: input.session_hash,
            password_hash: input.password_hash,
            expires_at: input.expires_at,
            is_active: input.is_active,
        };
        self.store.lock().unwrap().sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> GatehouseResult<Vec<Session>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_session_hash(&self, session_hash: &str) -> GatehouseResult<Vec<Session>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .iter()
            .filter(|s| s.session_hash == session_hash)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: Uuid) -> GatehouseResult<u64> {
        remove_where(&mut self.store.lock().unwrap(), |s| s.id == Some(id))
    }

    async fn delete_by_hash(&self, session_hash: &str) -> GatehouseResult<u64> {
        remove_where(&mut self.store.lock().unwrap(), |s| {
            s.session_hash == session_hash
        })
    }

    async fn deactivate(&self, id: Uuid) -> GatehouseResult<u64> {
        let mut store = self.store.lock().unwrap();
        let mut updated = 0;
        for session in store.sessions.iter_mut().filter(|s| s.id == Some(id)) {
            session.is_active = false;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> GatehouseResult<u64> {
        remove_where(&mut self.store.lock().unwrap(), |s| s.user_id == user_id)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> GatehouseResult<u64> {
        remove_where(&mut self.store.lock().unwrap(), |s| s.is_expired(now))
    }
}

fn setup() -> (
    SessionService<MemoryDirectory, MemorySessionRepository>,
    MemorySessionRepository,
    Uuid,
) {
    let user_id = Uuid::new_v4();
    let repo = MemorySessionRepository::default();
    let svc = SessionService::new(
        MemoryDirectory::with_user(user_id),
        repo.clone(),
        SessionConfig::default(),
    );
    (svc, repo, user_id)
}

#[tokio::test]
async fn prune_failure_still_returns_live_sessions() {
    let (svc, repo, user_id) = setup();
    let now = Utc::now();

    let stuck = repo.seed(user_id, "expired_a", now - Duration::hours(2));
    let pruned = repo.seed(user_id, "expired_b", now - Duration::hours(1));
    let live = repo.seed(user_id, "live", now + Duration::hours(1));
    repo.fail_delete_of(&stuck);

    let active = svc.list_active(user_id).await.unwrap();
    assert_eq!(active.sessions, vec![live.clone()]);
    assert!(
        matches!(active.prune_error, Some(GatehouseError::Database(_))),
        "expected prune error, got: {:?}",
        active.prune_error
    );

    // The prunable one is gone; the stuck one stays in storage.
    let ids = repo.ids();
    assert!(!ids.contains(&pruned.id.unwrap()));
    assert!(ids.contains(&stuck.id.unwrap()));

    // Neither expired session is ever listed again.
    let again = svc.list_active(user_id).await.unwrap();
    assert_eq!(again.sessions, vec![live]);
}

#[tokio::test]
async fn prune_error_reports_the_last_failure() {
    let (svc, repo, user_id) = setup();
    let now = Utc::now();

    let first = repo.seed(user_id, "expired_a", now - Duration::hours(2));
    let last = repo.seed(user_id, "expired_b", now - Duration::hours(1));
    repo.fail_delete_of(&first);
    repo.fail_delete_of(&last);

    let active = svc.list_active(user_id).await.unwrap();
    assert!(active.sessions.is_empty());
    match active.prune_error {
        Some(GatehouseError::Database(msg)) => {
            assert!(msg.contains(&last.id.unwrap().to_string()), "{msg}");
        }
        other => panic!("expected Database error, got: {other:?}"),
    }
}

#[tokio::test]
async fn into_result_surfaces_prune_error() {
    let (svc, repo, user_id) = setup();
    let stuck = repo.seed(user_id, "expired", Utc::now() - Duration::hours(1));
    repo.fail_delete_of(&stuck);

    let err = svc
        .list_active(user_id)
        .await
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Database(_)));

    let clean = ActiveSessions::default().into_result().unwrap();
    assert!(clean.is_empty());
}

#[tokio::test]
async fn delete_of_missing_session_is_not_exist_not_storage_error() {
    let (svc, repo, user_id) = setup();
    let session = repo.seed(user_id, "gone", Utc::now() + Duration::hours(1));

    svc.delete(&session).await.unwrap();
    let err = svc.delete(&session).await.unwrap_err();
    assert!(
        matches!(err, GatehouseError::SessionNotExist { user_id: u } if u == user_id),
        "expected SessionNotExist, got: {err:?}"
    );
}

#[tokio::test]
async fn delete_by_client_stops_at_first_failure() {
    let (svc, repo, user_id) = setup();

    // Seed through the service so the hashes match the client identity.
    let mut created = Vec::new();
    for password in ["one", "two", "three"] {
        created.push(
            svc.create(NewSession {
                user_id,
                ip_address: "198.51.100.4".into(),
                client: "agent".into(),
                password: password.into(),
                ttl_secs: Some(3600),
            })
            .await
            .unwrap(),
        );
    }
    // delete() of a session with an id goes through delete_by_id only, so
    // failing the second leaves the first deleted and the third untouched.
    repo.fail_delete_of(&created[1]);

    let err = svc
        .delete_by_client(user_id, "198.51.100.4", "agent")
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Database(_)));

    let ids = repo.ids();
    assert!(!ids.contains(&created[0].id.unwrap()));
    assert!(ids.contains(&created[1].id.unwrap()));
    assert!(ids.contains(&created[2].id.unwrap()));
}

#[tokio::test]
async fn revoke_without_id_is_not_exist() {
    let (svc, repo, user_id) = setup();
    let mut session = repo.seed(user_id, "anon", Utc::now() + Duration::hours(1));
    session.id = None;

    let err = svc.revoke(&session).await.unwrap_err();
    assert!(matches!(err, GatehouseError::SessionNotExist { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_produce_distinct_sessions() {
    let (svc, repo, user_id) = setup();
    let svc = Arc::new(svc);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                svc.create(NewSession {
                    user_id,
                    ip_address: format!("192.0.2.{i}"),
                    client: "agent".into(),
                    password: "pw".into(),
                    ttl_secs: Some(3600),
                })
                .await
            })
        })
        .collect();

    let mut hashes = HashSet::new();
    for handle in handles {
        let session = handle.await.unwrap().unwrap();
        hashes.insert(session.session_hash);
    }

    assert_eq!(hashes.len(), 4);
    assert_eq!(repo.ids().len(), 4);
    assert_eq!(svc.list_active(user_id).await.unwrap().sessions.len(), 4);
}

#[tokio::test]
async fn digests_do_not_stall_the_executor() {
    let (svc, _, user_id) = setup();

    // On a single-threaded runtime this task only advances while `create`
    // is suspended.
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(StdDuration::from_millis(5)).await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    svc.create(NewSession {
        user_id,
        ip_address: "192.0.2.1".into(),
        client: "agent".into(),
        password: "pw".into(),
        ttl_secs: Some(3600),
    })
    .await
    .unwrap();

    let observed = ticks.load(Ordering::Relaxed);
    ticker.abort();
    assert!(observed > 0, "executor was blocked during digest derivation");
}
