//! Retention sweep configuration

use serde::{Deserialize, Serialize};

/// Longest audit window a configuration may ask for (ten years)
pub const MAX_AUDIT_RETENTION_DAYS: i64 = 3650;

/// Configuration for the periodic purge of dead refresh tokens
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Whether the scheduled sweep runs at all
    pub enabled: bool,
    /// How often to run the sweep (in seconds)
    pub interval_seconds: u64,
    /// How long revoked tokens are kept for reuse investigations (in days)
    pub audit_retention_days: i64,
    /// Maximum number of rows removed by one delete statement
    pub batch_size: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 86400, // Run daily
            audit_retention_days: 30,
            batch_size: 1000,
        }
    }
}

impl RetentionConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("TOKEN_SWEEP_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            interval_seconds: std::env::var("TOKEN_SWEEP_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.interval_seconds),
            audit_retention_days: std::env::var("TOKEN_AUDIT_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.audit_retention_days),
            batch_size: std::env::var("TOKEN_SWEEP_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.batch_size),
        }
    }

    /// Check that the audit window lies within `0..=MAX_AUDIT_RETENTION_DAYS`
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=MAX_AUDIT_RETENTION_DAYS).contains(&self.audit_retention_days) {
            return Err(format!(
                "audit_retention_days must be between 0 and {}, got {}",
                MAX_AUDIT_RETENTION_DAYS, self.audit_retention_days
            ));
        }
        Ok(())
    }

    /// Batch size clamped to at least one row
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
