//! Configuration module with business-specific sub-modules
//!
//! - `database` - MySQL connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `retention` - Schedule and audit window of the token sweep
//! - `session` - Refresh token lifetime, hashing secret and reuse policy

pub mod database;
pub mod environment;
pub mod retention;
pub mod session;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use retention::{RetentionConfig, MAX_AUDIT_RETENTION_DAYS};
pub use session::{ReusePolicy, SessionConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Refresh token configuration
    pub session: SessionConfig,

    /// Token sweep configuration
    pub retention: RetentionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create configuration for the given environment with its defaults
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            logging: LoggingConfig::for_environment(environment),
            ..Default::default()
        }
    }

    /// Load configuration from plain environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|f| f.parse().ok()) {
            logging.format = format;
        }

        Self {
            environment,
            database: DatabaseConfig::from_env(),
            session: SessionConfig::from_env(),
            retention: RetentionConfig::from_env(),
            logging,
        }
    }

    /// Load layered configuration
    ///
    /// Sources, lowest priority first:
    /// 1. Built-in defaults
    /// 2. `config/<environment>.toml` (optional)
    /// 3. `RT__`-prefixed environment variables, e.g. `RT__SESSION__REFRESH_TOKEN_TTL`
    pub fn load() -> Result<Self, ::config::ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let settings = ::config::Config::builder()
            .set_default("environment", environment.to_string())?
            .add_source(::config::File::with_name(environment.config_file()).required(false))
            .add_source(
                ::config::Environment::with_prefix("RT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
