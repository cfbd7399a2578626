//! Refresh token session configuration

use serde::{Deserialize, Serialize};

const DEFAULT_HASHING_SECRET: &str = "development-refresh-secret-change-in-production!";

/// What the rotator does when an already-rotated token is presented again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Revoke every refresh token held by the subject
    #[default]
    RevokeSubject,
    /// Revoke only the session family the replayed token belongs to
    RevokeFamily,
    /// Reject the request and leave the remaining tokens untouched
    RejectOnly,
}

impl std::str::FromStr for ReusePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "revoke_subject" | "subject" => Ok(ReusePolicy::RevokeSubject),
            "revoke_family" | "family" => Ok(ReusePolicy::RevokeFamily),
            "reject_only" | "reject" => Ok(ReusePolicy::RejectOnly),
            _ => Err(format!("Invalid reuse policy: {}", s)),
        }
    }
}

/// Refresh token issuing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: i64,

    /// Random bytes per token value (at least 32)
    pub token_bytes: usize,

    /// Server secret keying the stored token hash
    pub hashing_secret: String,

    /// Response to a replayed (already revoked) token
    pub reuse_policy: ReusePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_token_ttl: 2_592_000, // 30 days
            token_bytes: 32,
            hashing_secret: String::from(DEFAULT_HASHING_SECRET),
            reuse_policy: ReusePolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with a hashing secret
    pub fn new(hashing_secret: impl Into<String>) -> Self {
        Self {
            hashing_secret: hashing_secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let hashing_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .unwrap_or(defaults.hashing_secret);
        let refresh_token_ttl = std::env::var("REFRESH_TOKEN_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.refresh_token_ttl);
        let token_bytes = std::env::var("REFRESH_TOKEN_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.token_bytes);
        let reuse_policy = std::env::var("REFRESH_TOKEN_REUSE_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.reuse_policy);

        Self {
            refresh_token_ttl,
            token_bytes,
            hashing_secret,
            reuse_policy,
        }
    }

    /// Set refresh token lifetime in days
    pub fn with_ttl_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl = days * 86400;
        self
    }

    /// Set the reuse policy
    pub fn with_reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    /// Check if using the development secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.hashing_secret == DEFAULT_HASHING_SECRET
    }
}
