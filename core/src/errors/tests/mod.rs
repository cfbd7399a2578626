//! Unit tests for domain error types

use rt_shared::errors::ErrorResponse;

use crate::errors::{DomainError, StoreError, TokenError};

#[test]
fn test_token_failures_map_to_unauthorized() {
    for err in [
        TokenError::UnknownToken,
        TokenError::Expired,
        TokenError::Revoked,
        TokenError::ReuseDetected,
    ] {
        assert_eq!(err.status_code(), 401);
        assert!(err.requires_reauthentication());
        assert!(!err.is_transient());
    }
}

#[test]
fn test_store_unavailable_is_transient_server_error() {
    let err: TokenError = StoreError::Unavailable("connection refused".to_string()).into();

    assert_eq!(err.status_code(), 503);
    assert!(err.is_transient());
    assert!(!err.requires_reauthentication());
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_invalid_subject_is_bad_request() {
    assert_eq!(TokenError::InvalidSubject.status_code(), 400);
    assert!(!TokenError::InvalidSubject.requires_reauthentication());
}

#[test]
fn test_reuse_and_revoked_have_distinct_codes() {
    assert_ne!(
        TokenError::ReuseDetected.error_code(),
        TokenError::Revoked.error_code()
    );
}

#[test]
fn test_token_error_conversion() {
    let response: ErrorResponse = TokenError::Expired.into();

    assert_eq!(response.error, "REFRESH_TOKEN_EXPIRED");
    assert_eq!(response.status, 401);
    assert!(response.message.contains("expired"));
    assert_eq!(response.details.unwrap()["reauthenticate"], true);
}

#[test]
fn test_store_details_are_not_exposed_to_clients() {
    let err: TokenError = StoreError::Unavailable("mysql://admin:pw@db".to_string()).into();
    let response: ErrorResponse = err.into();

    assert_eq!(response.status, 503);
    assert!(!response.message.contains("mysql://"));
    assert_eq!(response.details.unwrap()["reauthenticate"], false);
}

#[test]
fn test_domain_error_bridges() {
    let err: DomainError = TokenError::Revoked.into();
    assert!(matches!(err, DomainError::Token(TokenError::Revoked)));

    let err: DomainError = StoreError::Duplicate.into();
    assert_eq!(err.to_string(), "Duplicate token hash");
}

#[test]
fn test_domain_error_conversion() {
    let response: ErrorResponse = DomainError::Validation {
        message: "secret too short".to_string(),
    }
    .into();
    assert_eq!(response.status, 400);
    assert_eq!(response.error, "VALIDATION_ERROR");

    let response: ErrorResponse = DomainError::Internal {
        message: "key setup failed".to_string(),
    }
    .into();
    assert_eq!(response.status, 500);
    assert!(!response.message.contains("key setup"));

    let response: ErrorResponse = DomainError::Store(StoreError::Corrupt("bad uuid".to_string())).into();
    assert_eq!(response.status, 503);
}
