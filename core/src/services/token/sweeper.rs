//! Retention sweeper for periodic purging of dead refresh tokens
//!
//! Two passes run per sweep:
//! 1. Unrevoked tokens past their expiry are deleted
//! 2. Revoked tokens are deleted once their audit window has elapsed
//!
//! Revoked rows are kept for the full audit window even after they expire,
//! so a replayed token can still be recognised as reuse instead of unknown.
//! Both passes delete in bounded batches and only match rows that are
//! already dead, so a sweep may run alongside live traffic and a crash
//! mid-pass is resumed by the next tick.

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use rt_shared::config::RetentionConfig;

use crate::errors::StoreError;
use crate::repositories::token::TokenStore;

/// Receives every sweep report, e.g. to feed a metrics collector
pub trait SweepObserver: Send + Sync {
    fn on_sweep(&self, report: &SweepReport);
}

/// Result of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Unrevoked tokens deleted after expiry
    pub expired_deleted: usize,
    /// Revoked tokens deleted after the audit window
    pub revoked_deleted: usize,
    /// Delete statements issued across both passes
    pub batches: usize,
    /// Any errors encountered during the sweep
    pub errors: Vec<String>,
    /// Wall time of the sweep
    pub elapsed: StdDuration,
}

impl SweepReport {
    /// Check if the sweep was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of records deleted
    pub fn total_deleted(&self) -> usize {
        self.expired_deleted + self.revoked_deleted
    }
}

#[derive(Debug, Clone, Copy)]
enum SweepPass {
    Expired,
    Revoked,
}

impl SweepPass {
    fn name(self) -> &'static str {
        match self {
            SweepPass::Expired => "expired",
            SweepPass::Revoked => "revoked",
        }
    }
}

/// Rows removed by one pass, even when it stopped on an error
struct PassOutcome {
    deleted: usize,
    batches: usize,
    error: Option<StoreError>,
}

/// Background purge of dead refresh tokens
pub struct RetentionSweeper<S: TokenStore + 'static> {
    store: Arc<S>,
    config: RetentionConfig,
    observer: Option<Arc<dyn SweepObserver>>,
}

impl<S: TokenStore + 'static> RetentionSweeper<S> {
    /// Create a new sweeper
    pub fn new(store: Arc<S>, config: RetentionConfig) -> Self {
        Self {
            store,
            config,
            observer: None,
        }
    }

    /// Attach an observer that receives every report
    pub fn with_observer(mut self, observer: Arc<dyn SweepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Run a single sweep
    ///
    /// Errors are recorded in the report and logged, never returned; a
    /// disabled sweeper returns an empty report without touching the store.
    pub async fn run_sweep(&self) -> SweepReport {
        if !self.config.enabled {
            return SweepReport::default();
        }

        let started = Instant::now();
        let now = Utc::now();
        let mut report = SweepReport::default();

        debug!("Starting refresh token sweep");

        let expired = self.drain(SweepPass::Expired, now).await;
        report.expired_deleted = expired.deleted;
        report.batches += expired.batches;
        if let Some(e) = expired.error {
            error!(deleted = expired.deleted, "Failed to delete expired refresh tokens: {}", e);
            report.errors.push(format!("Expired pass error: {}", e));
        }

        // An invalid audit window skips the revoked pass
        match self.audit_cutoff(now) {
            Ok(cutoff) => {
                let revoked = self.drain(SweepPass::Revoked, cutoff).await;
                report.revoked_deleted = revoked.deleted;
                report.batches += revoked.batches;
                if let Some(e) = revoked.error {
                    error!(deleted = revoked.deleted, "Failed to delete revoked refresh tokens: {}", e);
                    report.errors.push(format!("Revoked pass error: {}", e));
                }
            }
            Err(message) => {
                error!("Skipping revoked pass: {}", message);
                report.errors.push(format!("Revoked pass error: {}", message));
            }
        }

        report.elapsed = started.elapsed();

        info!(
            expired = report.expired_deleted,
            revoked = report.revoked_deleted,
            batches = report.batches,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Refresh token sweep completed"
        );

        if let Some(observer) = &self.observer {
            observer.on_sweep(&report);
        }

        report
    }

    /// Revocation time before which revoked rows may be deleted
    fn audit_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        self.config.validate()?;
        now.checked_sub_signed(Duration::days(self.config.audit_retention_days))
            .ok_or_else(|| String::from("audit window reaches before the earliest timestamp"))
    }

    /// Deletes batch after batch until one comes back short
    async fn drain(&self, pass: SweepPass, bound: DateTime<Utc>) -> PassOutcome {
        let limit = self.config.effective_batch_size();
        let mut outcome = PassOutcome {
            deleted: 0,
            batches: 0,
            error: None,
        };

        loop {
            let result = match pass {
                SweepPass::Expired => self.store.delete_expired(bound, limit).await,
                SweepPass::Revoked => self.store.delete_revoked_before(bound, limit).await,
            };

            match result {
                Ok(count) => {
                    outcome.batches += 1;
                    outcome.deleted += count;
                    debug!(pass = pass.name(), count, "Deleted refresh token batch");
                    if count < limit {
                        return outcome;
                    }
                }
                Err(e) => {
                    outcome.error = Some(e);
                    return outcome;
                }
            }
        }
    }

    /// Start the sweeper as a background task
    ///
    /// The first sweep runs immediately, then every `interval_seconds`.
    /// Returns `None` when the sweeper is disabled.
    pub fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Refresh token sweeper is disabled");
            return None;
        }

        let period = StdDuration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = period.as_secs(),
                audit_retention_days = self.config.audit_retention_days,
                "Refresh token sweeper started"
            );

            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                let report = self.run_sweep().await;
                if !report.is_success() {
                    warn!("Sweep completed with errors, retrying next tick: {:?}", report.errors);
                }
            }
        }))
    }
}
