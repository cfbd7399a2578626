//! Integration tests for the refresh token lifecycle
//!
//! Drives the public API of `rt_core` end to end: issue, rotate, replay,
//! logout and the retention sweep running against live traffic.

use std::sync::Arc;

use chrono::Duration;

use rt_core::{
    InMemoryTokenStore, RetentionSweeper, RotatorConfig, SessionRotator, TokenCodec, TokenError,
    TokenStore,
};
use rt_shared::config::{ReusePolicy, RetentionConfig, SessionConfig};
use rt_shared::errors::ErrorResponse;

const SECRET: &str = "integration-secret-with-at-least-32-bytes";

fn setup() -> (Arc<InMemoryTokenStore>, Arc<SessionRotator<InMemoryTokenStore>>) {
    let store = Arc::new(InMemoryTokenStore::new());
    let rotator = SessionRotator::from_config(store.clone(), &SessionConfig::new(SECRET)).unwrap();
    (store, Arc::new(rotator))
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let (_, rotator) = setup();

    // Login
    let t1 = rotator.issue("u1").await.unwrap();
    assert_eq!(rotator.validate(&t1.token).await.unwrap(), "u1");

    // Refresh
    let t2 = rotator.rotate(&t1.token).await.unwrap();
    assert_eq!(rotator.validate(&t1.token).await.unwrap_err(), TokenError::Revoked);
    assert_eq!(rotator.validate(&t2.token).await.unwrap(), "u1");

    // Replay of the old token
    let err = rotator.rotate(&t1.token).await.unwrap_err();
    assert_eq!(err, TokenError::ReuseDetected);
    assert!(err.requires_reauthentication());

    // Default policy killed the whole session
    assert_eq!(rotator.validate(&t2.token).await.unwrap_err(), TokenError::Revoked);
    assert!(rotator.active_sessions("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_everywhere() {
    let (_, rotator) = setup();
    let tokens = vec![
        rotator.issue("u1").await.unwrap(),
        rotator.issue("u1").await.unwrap(),
        rotator.issue("u1").await.unwrap(),
    ];

    assert_eq!(rotator.revoke_all("u1").await.unwrap(), 3);

    for issued in &tokens {
        assert_eq!(rotator.validate(&issued.token).await.unwrap_err(), TokenError::Revoked);
    }
}

#[tokio::test]
async fn test_errors_map_to_boundary_responses() {
    let (_, rotator) = setup();
    let unknown = rotator.codec().generate();

    let response: ErrorResponse = rotator.validate(&unknown).await.unwrap_err().into();
    assert_eq!(response.status, 401);
    assert_eq!(response.error, "REFRESH_TOKEN_UNKNOWN");

    let response: ErrorResponse = rotator.issue("").await.unwrap_err().into();
    assert_eq!(response.status, 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_of_one_token() {
    let (store, rotator) = setup();
    let t1 = rotator.issue("u1").await.unwrap();

    let (a, b) = tokio::join!(
        {
            let rotator = rotator.clone();
            let token = t1.token.clone();
            tokio::spawn(async move { rotator.rotate(&token).await })
        },
        {
            let rotator = rotator.clone();
            let token = t1.token.clone();
            tokio::spawn(async move { rotator.rotate(&token).await })
        }
    );
    let results = [a.unwrap(), b.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, TokenError::ReuseDetected | TokenError::Revoked)));
    // The loser triggered the reuse response, so nothing of u1 is live
    assert_eq!(store.count_active_by_subject("u1", chrono::Utc::now()).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rotation_chains_stay_linear_under_load() {
    let store = Arc::new(InMemoryTokenStore::new());
    let codec = TokenCodec::new(SECRET, 32).unwrap();
    let rotator = Arc::new(SessionRotator::new(
        store.clone(),
        codec,
        RotatorConfig {
            reuse_policy: ReusePolicy::RejectOnly,
            ..RotatorConfig::default()
        },
    ));

    let subjects: Vec<String> = (0..8).map(|i| format!("user_{}", i)).collect();
    let handles: Vec<_> = subjects
        .iter()
        .cloned()
        .map(|subject| {
            let rotator = rotator.clone();
            tokio::spawn(async move {
                let mut current = rotator.issue(&subject).await.unwrap();
                for _ in 0..10 {
                    current = rotator.rotate(&current.token).await.unwrap();
                }
                current
            })
        })
        .collect();

    for handle in handles {
        let tail = handle.await.unwrap();
        let sessions = rotator.active_sessions(tail.subject_id()).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, tail.record.id);
    }
    assert_eq!(store.len().await, 8 * 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_alongside_rotation_spares_live_tokens() {
    let (store, rotator) = setup();
    let expired_rotator = SessionRotator::new(
        store.clone(),
        TokenCodec::new(SECRET, 32).unwrap(),
        RotatorConfig {
            refresh_token_ttl: Duration::seconds(-1),
            ..RotatorConfig::default()
        },
    );
    for i in 0..50 {
        expired_rotator.issue(&format!("stale_{}", i)).await.unwrap();
    }
    let sweeper = RetentionSweeper::new(
        store.clone(),
        RetentionConfig {
            batch_size: 5,
            ..RetentionConfig::default()
        },
    );

    let traffic = {
        let rotator = rotator.clone();
        tokio::spawn(async move {
            let mut current = rotator.issue("active").await.unwrap();
            for _ in 0..20 {
                current = rotator.rotate(&current.token).await.unwrap();
            }
            current
        })
    };
    let report = sweeper.run_sweep().await;
    let tail = traffic.await.unwrap();

    assert_eq!(report.expired_deleted, 50);
    assert!(report.is_success());
    assert_eq!(rotator.validate(&tail.token).await.unwrap(), "active");
}
