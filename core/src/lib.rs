//! # Refresh Token Core
//!
//! Domain and service layer of the refresh token lifecycle manager.
//! This crate contains the token record entity, the error taxonomy, the
//! `TokenStore` contract with an in-memory implementation, and the services
//! that issue, rotate, revoke and sweep refresh tokens.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{IssuedToken, NewRefreshToken, RefreshTokenRecord};
pub use errors::{DomainError, DomainResult, StoreError, TokenError};
pub use repositories::{InMemoryTokenStore, RotationOutcome, Successor, TokenStore};
pub use services::{
    RetentionSweeper, RotatorConfig, SessionRotator, SweepObserver, SweepReport, TokenCodec,
};
