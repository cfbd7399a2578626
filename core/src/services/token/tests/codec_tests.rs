//! Tests for token value generation and hashing

use std::collections::HashSet;

use rt_shared::config::SessionConfig;

use crate::errors::DomainError;
use crate::services::token::{TokenCodec, MIN_SECRET_BYTES};

const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

fn codec() -> TokenCodec {
    TokenCodec::new(SECRET, 32).unwrap()
}

#[test]
fn test_generated_values_are_43_char_base64url() {
    let codec = codec();
    let token = codec.generate();

    assert_eq!(token.len(), 43);
    assert_eq!(codec.encoded_len(), 43);
    assert!(!token.contains('='));
    assert!(!token.contains('+'));
    assert!(!token.contains('/'));
    assert!(codec.is_well_formed(&token));
}

#[test]
fn test_generated_values_are_unique() {
    let codec = codec();
    let values: HashSet<String> = (0..1000).map(|_| codec.generate()).collect();
    assert_eq!(values.len(), 1000);
}

#[test]
fn test_hash_is_deterministic_lowercase_hex() {
    let codec = codec();
    let hash = codec.hash("some-token");

    assert_eq!(hash, codec.hash("some-token"));
    assert_ne!(hash, codec.hash("other-token"));
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_hash_depends_on_secret() {
    let other = TokenCodec::new("another-secret-that-is-also-32-bytes!!", 32).unwrap();
    assert_ne!(codec().hash("token"), other.hash("token"));
}

#[test]
fn test_short_secret_is_rejected() {
    let result = TokenCodec::new("short", 32);
    assert!(matches!(result, Err(DomainError::Validation { .. })));

    let just_enough = "x".repeat(MIN_SECRET_BYTES);
    assert!(TokenCodec::new(just_enough, 32).is_ok());
}

#[test]
fn test_too_few_token_bytes_are_rejected() {
    assert!(matches!(
        TokenCodec::new(SECRET, 16),
        Err(DomainError::Validation { .. })
    ));

    let wide = TokenCodec::new(SECRET, 48).unwrap();
    assert_eq!(wide.generate().len(), 64);
}

#[test]
fn test_is_well_formed_rejects_garbage() {
    let codec = codec();

    assert!(!codec.is_well_formed(""));
    assert!(!codec.is_well_formed("too-short"));
    assert!(!codec.is_well_formed(&"a".repeat(44)));
    assert!(!codec.is_well_formed(&format!("{}=", "a".repeat(42))));
    assert!(!codec.is_well_formed(&format!("{}/", "a".repeat(42))));
    assert!(codec.is_well_formed(&format!("{}-_", "a".repeat(41))));
}

#[test]
fn test_from_config_and_debug_hides_key() {
    let config = SessionConfig::new(SECRET);
    let codec = TokenCodec::from_config(&config).unwrap();
    let rendered = format!("{:?}", codec);

    assert!(rendered.contains("token_bytes"));
    assert!(!rendered.contains(SECRET));
}
