//! Unit tests for the in-memory token store

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{NewRefreshToken, RefreshTokenRecord};
use crate::errors::StoreError;
use crate::repositories::token::{InMemoryTokenStore, RotationOutcome, Successor, TokenStore};

fn new_token(subject: &str, hash: &str, ttl: Duration) -> NewRefreshToken {
    NewRefreshToken::family_root(subject, hash.to_string(), Utc::now(), ttl)
}

fn successor(hash: &str) -> Successor {
    let now = Utc::now();
    Successor {
        token_hash: hash.to_string(),
        issued_at: now,
        expires_at: now + Duration::days(30),
    }
}

fn revoked_record(hash: &str, revoked_at: chrono::DateTime<Utc>) -> RefreshTokenRecord {
    let mut record = new_token("u1", hash, Duration::days(60)).into_record(Uuid::new_v4());
    record.revoke(revoked_at);
    record
}

#[tokio::test]
async fn test_insert_assigns_id_and_find_by_hash() {
    let store = InMemoryTokenStore::new();

    let saved = store.insert(new_token("u1", "hash_a", Duration::days(30))).await.unwrap();
    let found = store.find_by_hash("hash_a").await.unwrap().unwrap();

    assert_eq!(found.id, saved.id);
    assert_eq!(found.subject_id, "u1");
    assert!(!found.revoked);
    assert!(store.find_by_hash("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_hash_is_rejected() {
    let store = InMemoryTokenStore::new();

    store.insert(new_token("u1", "same_hash", Duration::days(30))).await.unwrap();
    let result = store.insert(new_token("u2", "same_hash", Duration::days(30))).await;

    assert_eq!(result.unwrap_err(), StoreError::Duplicate);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_find_active_by_subject_skips_dead_records() {
    let store = InMemoryTokenStore::new();

    store.insert(new_token("u1", "live_1", Duration::days(30))).await.unwrap();
    store.insert(new_token("u1", "live_2", Duration::days(30))).await.unwrap();
    store.insert(new_token("u1", "expired", Duration::seconds(-1))).await.unwrap();
    store.insert(new_token("u1", "revoked", Duration::days(30))).await.unwrap();
    store.insert(new_token("u2", "other", Duration::days(30))).await.unwrap();
    store.revoke_by_hash("revoked", Utc::now()).await.unwrap();

    let active = store.find_active_by_subject("u1", Utc::now()).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(store.count_active_by_subject("u2", Utc::now()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_revoke_by_hash_is_conditional() {
    let store = InMemoryTokenStore::new();
    store.insert(new_token("u1", "hash", Duration::days(30))).await.unwrap();

    let first = Utc::now();
    assert!(store.revoke_by_hash("hash", first).await.unwrap());
    assert!(!store.revoke_by_hash("hash", first + Duration::minutes(5)).await.unwrap());
    assert!(!store.revoke_by_hash("nonexistent", first).await.unwrap());

    let found = store.find_by_hash("hash").await.unwrap().unwrap();
    assert!(found.revoked);
    assert_eq!(found.revoked_at, Some(first));
}

#[tokio::test]
async fn test_revoke_by_subject_and_family() {
    let store = InMemoryTokenStore::new();
    let root = store.insert(new_token("u1", "a", Duration::days(30))).await.unwrap();
    store.insert(new_token("u1", "b", Duration::days(30))).await.unwrap();
    store.insert(new_token("u2", "c", Duration::days(30))).await.unwrap();

    assert_eq!(store.revoke_by_family(root.family_id, Utc::now()).await.unwrap(), 1);
    assert_eq!(store.revoke_by_subject("u1", Utc::now()).await.unwrap(), 1);
    assert_eq!(store.revoke_by_subject("u1", Utc::now()).await.unwrap(), 0);
    assert_eq!(store.count_active_by_subject("u2", Utc::now()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_rotate_revokes_and_links_successor() {
    let store = InMemoryTokenStore::new();
    let root = store.insert(new_token("u1", "old", Duration::days(30))).await.unwrap();

    let outcome = store.rotate("old", successor("new")).await.unwrap();
    let (previous, next) = match outcome {
        RotationOutcome::Rotated { previous, successor } => (previous, successor),
        other => panic!("expected rotation, got {:?}", other),
    };

    assert_eq!(previous.id, root.id);
    assert!(previous.revoked);
    assert_eq!(next.parent_id, Some(root.id));
    assert_eq!(next.family_id, root.family_id);
    assert!(next.is_valid());
    assert!(store.find_by_hash("old").await.unwrap().unwrap().revoked);
}

#[tokio::test]
async fn test_rotate_rejections_leave_state_untouched() {
    let store = InMemoryTokenStore::new();
    store.insert(new_token("u1", "expired", Duration::seconds(-1))).await.unwrap();
    store.insert_record(revoked_record("revoked", Utc::now())).await.unwrap();

    assert_eq!(store.rotate("missing", successor("n1")).await.unwrap(), RotationOutcome::NotFound);
    assert!(matches!(
        store.rotate("expired", successor("n2")).await.unwrap(),
        RotationOutcome::Expired(_)
    ));
    assert!(matches!(
        store.rotate("revoked", successor("n3")).await.unwrap(),
        RotationOutcome::AlreadyRevoked(_)
    ));

    assert_eq!(store.len().await, 2);
    assert!(!store.find_by_hash("expired").await.unwrap().unwrap().revoked);
}

#[tokio::test]
async fn test_rotate_with_colliding_successor_changes_nothing() {
    let store = InMemoryTokenStore::new();
    store.insert(new_token("u1", "old", Duration::days(30))).await.unwrap();
    store.insert(new_token("u2", "taken", Duration::days(30))).await.unwrap();

    let result = store.rotate("old", successor("taken")).await;

    assert_eq!(result.unwrap_err(), StoreError::Duplicate);
    assert!(!store.find_by_hash("old").await.unwrap().unwrap().revoked);
}

#[tokio::test]
async fn test_delete_expired_keeps_revoked_records() {
    let store = InMemoryTokenStore::new();
    for i in 0..3 {
        store.insert(new_token("u1", &format!("expired_{}", i), Duration::days(-1))).await.unwrap();
    }
    store.insert(new_token("u1", "valid", Duration::days(7))).await.unwrap();
    let mut revoked_expired = revoked_record("revoked_expired", Utc::now() - Duration::days(2));
    revoked_expired.expires_at = Utc::now() - Duration::days(1);
    store.insert_record(revoked_expired).await.unwrap();

    let deleted = store.delete_expired(Utc::now(), 100).await.unwrap();

    assert_eq!(deleted, 3);
    assert!(store.find_by_hash("valid").await.unwrap().is_some());
    assert!(store.find_by_hash("revoked_expired").await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_expired_honours_limit() {
    let store = InMemoryTokenStore::new();
    for i in 0..5 {
        store.insert(new_token("u1", &format!("expired_{}", i), Duration::days(-1))).await.unwrap();
    }

    assert_eq!(store.delete_expired(Utc::now(), 2).await.unwrap(), 2);
    assert_eq!(store.delete_expired(Utc::now(), 2).await.unwrap(), 2);
    assert_eq!(store.delete_expired(Utc::now(), 2).await.unwrap(), 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_delete_revoked_before_cutoff() {
    let store = InMemoryTokenStore::new();
    let cutoff = Utc::now() - Duration::days(30);
    store.insert_record(revoked_record("stale", cutoff - Duration::days(1))).await.unwrap();
    store.insert_record(revoked_record("recent", cutoff + Duration::days(1))).await.unwrap();
    store.insert(new_token("u1", "live", Duration::days(7))).await.unwrap();

    assert_eq!(store.delete_revoked_before(cutoff, 100).await.unwrap(), 1);
    assert!(store.find_by_hash("stale").await.unwrap().is_none());
    assert!(store.find_by_hash("recent").await.unwrap().is_some());
    assert!(store.find_by_hash("live").await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_by_subject() {
    let store = InMemoryTokenStore::new();
    store.insert(new_token("u1", "a", Duration::days(7))).await.unwrap();
    store.insert(new_token("u1", "b", Duration::days(7))).await.unwrap();
    store.insert(new_token("u2", "c", Duration::days(7))).await.unwrap();

    assert_eq!(store.delete_by_subject("u1").await.unwrap(), 2);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_find_by_id_and_mark_revoked() {
    let store = InMemoryTokenStore::new();
    let saved = store.insert(new_token("u1", "hash", Duration::days(7))).await.unwrap();

    assert_eq!(store.find_by_id(saved.id).await.unwrap().unwrap().token_hash, "hash");
    assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());

    assert!(store.mark_revoked(saved.id, Utc::now()).await.unwrap());
    assert!(!store.mark_revoked(saved.id, Utc::now()).await.unwrap());
    assert!(!store.mark_revoked(Uuid::new_v4(), Utc::now()).await.unwrap());
    assert!(store.find_by_id(saved.id).await.unwrap().unwrap().revoked);
}
