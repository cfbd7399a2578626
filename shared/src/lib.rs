//! Shared configuration and boundary types for the refresh token server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (environment, database, session, retention, logging)
//! - The `ErrorResponse` structure handed to the HTTP boundary

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, Environment,
    DatabaseConfig, SessionConfig, ReusePolicy, RetentionConfig,
    LoggingConfig, LogFormat,
};
pub use errors::{ErrorResponse, error_codes};
