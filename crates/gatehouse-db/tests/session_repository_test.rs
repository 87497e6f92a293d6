//! Integration tests for the Session repository using in-memory SurrealDB.

use chrono::{Duration, SubsecRound, Utc};
use gatehouse_core::models::session::CreateSession;
use gatehouse_core::repository::SessionRepository;
use gatehouse_db::repository::SurrealSessionRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> SurrealSessionRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatehouse_db::run_migrations(&db).await.unwrap();
    SurrealSessionRepository::new(db)
}

fn new_session(user_id: Uuid, session_hash: &str, ttl: Duration) -> CreateSession {
    CreateSession {
        user_id,
        session_hash: session_hash.into(),
        password_hash: "password_hash".into(),
        expires_at: Utc::now().trunc_subsecs(0) + ttl,
        is_active: true,
    }
}

#[tokio::test]
async fn insert_assigns_id_and_round_trips_fields() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();
    let input = new_session(user_id, "hash_a", Duration::hours(1));
    let expires_at = input.expires_at;

    let session = repo.insert(input).await.unwrap();
    assert!(session.id.is_some());
    assert_eq!(session.user_id, user_id);
    assert_eq!(session.session_hash, "hash_a");
    assert_eq!(session.expires_at, expires_at);
    assert!(session.is_active);

    let found = repo.find_by_user_id(user_id).await.unwrap();
    assert_eq!(found, vec![session]);
}

#[tokio::test]
async fn find_by_user_id_only_returns_that_user() {
    let repo = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for i in 0..3 {
        repo.insert(new_session(alice, &format!("alice_{i}"), Duration::hours(1)))
            .await
            .unwrap();
    }
    repo.insert(new_session(bob, "bob_0", Duration::hours(1)))
        .await
        .unwrap();

    let sessions = repo.find_by_user_id(alice).await.unwrap();
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|s| s.user_id == alice));
}

#[tokio::test]
async fn find_by_session_hash_returns_all_matches() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    repo.insert(new_session(user_id, "shared", Duration::hours(1)))
        .await
        .unwrap();
    repo.insert(new_session(user_id, "shared", Duration::hours(2)))
        .await
        .unwrap();
    repo.insert(new_session(user_id, "other", Duration::hours(1)))
        .await
        .unwrap();

    let sessions = repo.find_by_session_hash("shared").await.unwrap();
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn delete_by_id_reports_rows_affected() {
    let repo = setup().await;
    let session = repo
        .insert(new_session(Uuid::new_v4(), "to_delete", Duration::hours(1)))
        .await
        .unwrap();
    let id = session.id.unwrap();

    assert_eq!(repo.delete_by_id(id).await.unwrap(), 1);
    // Second delete finds nothing.
    assert_eq!(repo.delete_by_id(id).await.unwrap(), 0);
    assert!(repo.find_by_session_hash("to_delete").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_by_hash_removes_every_match() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();
    for _ in 0..2 {
        repo.insert(new_session(user_id, "dup", Duration::hours(1)))
            .await
            .unwrap();
    }

    assert_eq!(repo.delete_by_hash("dup").await.unwrap(), 2);
    assert_eq!(repo.delete_by_hash("dup").await.unwrap(), 0);
}

#[tokio::test]
async fn deactivate_clears_active_flag_only() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();
    let session = repo
        .insert(new_session(user_id, "logout", Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(repo.deactivate(session.id.unwrap()).await.unwrap(), 1);

    let stored = repo.find_by_user_id(user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].is_active);
    assert_eq!(stored[0].session_hash, session.session_hash);
    assert_eq!(stored[0].expires_at, session.expires_at);
}

#[tokio::test]
async fn deactivate_unknown_id_affects_nothing() {
    let repo = setup().await;
    assert_eq!(repo.deactivate(Uuid::new_v4()).await.unwrap(), 0);
    // And does not create a record.
    assert!(repo.find_by_session_hash("").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_by_user_id_removes_only_that_user() {
    let repo = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    for i in 0..3 {
        repo.insert(new_session(alice, &format!("alice_{i}"), Duration::hours(1)))
            .await
            .unwrap();
    }
    repo.insert(new_session(bob, "bob_0", Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(repo.delete_by_user_id(alice).await.unwrap(), 3);
    assert!(repo.find_by_user_id(alice).await.unwrap().is_empty());
    assert_eq!(repo.find_by_user_id(bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_expired_keeps_live_sessions() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    for i in 0..2 {
        repo.insert(new_session(user_id, &format!("expired_{i}"), -Duration::hours(1)))
            .await
            .unwrap();
    }
    let live = repo
        .insert(new_session(user_id, "live", Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 2);
    assert_eq!(repo.find_by_user_id(user_id).await.unwrap(), vec![live]);
}
