//! Configuration for the session rotator

use chrono::Duration;

use rt_shared::config::{ReusePolicy, SessionConfig};

use crate::domain::entities::token::{DEFAULT_REFRESH_TOKEN_TTL_DAYS, MAX_REFRESH_TOKEN_TTL_DAYS};
use crate::errors::DomainError;

/// Configuration for the session rotator
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Lifetime of every issued or rotated refresh token
    pub refresh_token_ttl: Duration,
    /// Response to a replayed token
    pub reuse_policy: ReusePolicy,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            reuse_policy: ReusePolicy::default(),
        }
    }
}

impl TryFrom<&SessionConfig> for RotatorConfig {
    type Error = DomainError;

    /// Fails unless the lifetime is positive and at most
    /// `MAX_REFRESH_TOKEN_TTL_DAYS`
    fn try_from(config: &SessionConfig) -> Result<Self, Self::Error> {
        let max_seconds = MAX_REFRESH_TOKEN_TTL_DAYS * 86_400;
        if config.refresh_token_ttl <= 0 || config.refresh_token_ttl > max_seconds {
            return Err(DomainError::Validation {
                message: format!(
                    "refresh token lifetime must be between 1 and {} seconds, got {}",
                    max_seconds, config.refresh_token_ttl
                ),
            });
        }

        Ok(Self {
            refresh_token_ttl: Duration::seconds(config.refresh_token_ttl),
            reuse_policy: config.reuse_policy,
        })
    }
}
