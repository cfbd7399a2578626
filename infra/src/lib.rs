//! # Infrastructure Layer
//!
//! Concrete adapters for the refresh token lifecycle manager:
//!
//! - **Database**: MySQL `TokenStore` implementation and pool management using SQLx
//! - **Logging**: tracing subscriber setup driven by `LoggingConfig`
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

// Re-export core types for convenience
pub use rt_core::errors::{DomainError, StoreError, TokenError};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Logging module - tracing subscriber initialisation
pub mod logging;

/// Load the application configuration
///
/// Settings come from `.env`, the optional `config/<environment>` file and
/// `RT__`-prefixed environment variables.
pub fn load_config() -> Result<rt_shared::AppConfig, InfrastructureError> {
    Ok(rt_shared::AppConfig::load()?)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for InfrastructureError {
    fn from(err: config::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
